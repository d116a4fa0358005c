use crate::domain::colors;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskCategory {
    School,
    Personal,
    Work,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::School => "School",
            Self::Personal => "Personal",
            Self::Work => "Work",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "school" => Some(Self::School),
            "personal" => Some(Self::Personal),
            "work" => Some(Self::Work),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventCategory {
    School,
    Personal,
    Work,
    Meeting,
    Other,
}

impl EventCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::School => "School",
            Self::Personal => "Personal",
            Self::Work => "Work",
            Self::Meeting => "Meeting",
            Self::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "school" => Some(Self::School),
            "personal" => Some(Self::Personal),
            "work" => Some(Self::Work),
            "meeting" => Some(Self::Meeting),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn default_color(self) -> &'static str {
        colors::default_color_for(self.as_str())
    }
}

impl From<TaskCategory> for EventCategory {
    fn from(category: TaskCategory) -> Self {
        match category {
            TaskCategory::School => Self::School,
            TaskCategory::Personal => Self::Personal,
            TaskCategory::Work => Self::Work,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrencePattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "short_break",
            Self::LongBreak => "long_break",
        }
    }

    /// Accepts the snake_case names plus the camelCase and kebab-case
    /// spellings the browser timer sends.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "focus" | "pomodoro" => Some(Self::Focus),
            "shortbreak" => Some(Self::ShortBreak),
            "longbreak" => Some(Self::LongBreak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubtaskProgress {
    #[serde(rename = "subtask_total")]
    pub total: u32,
    #[serde(rename = "subtask_completed")]
    pub completed: u32,
    #[serde(rename = "progress_percent")]
    pub percent: u32,
}

impl SubtaskProgress {
    pub fn new(total: u32, completed: u32) -> Self {
        let completed = completed.min(total);
        let percent = if total == 0 {
            0
        } else {
            completed * 100 / total
        };
        Self {
            total,
            completed,
            percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub category: TaskCategory,
    pub difficulty: Difficulty,
    pub completed: bool,
    pub favorite: bool,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub add_to_calendar: bool,
    pub linked_calendar_event_id: Option<i64>,
    #[serde(flatten)]
    pub progress: SubtaskProgress,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "task.title")?;
        validate_max_len(&self.title, MAX_TITLE_LEN, "task.title")?;
        if self.priority < 0 {
            return Err("task.priority must be >= 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubTask {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl SubTask {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "subtask.title")?;
        validate_max_len(&self.title, MAX_TITLE_LEN, "subtask.title")
    }
}

/// Where an event sits in a recurring family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Standalone,
    RecurringParent,
    Instance { parent_id: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "hhmm")]
    pub end_time: Option<NaiveTime>,
    pub category: EventCategory,
    pub color: String,
    pub reminder_enabled: bool,
    pub reminder_minutes_before: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub parent_event_id: Option<i64>,
}

pub const DEFAULT_REMINDER_MINUTES: u32 = 15;
pub const MAX_TITLE_LEN: usize = 200;

impl CalendarEvent {
    /// An unsaved standalone event with the category's default color.
    pub fn draft(
        user_id: i64,
        title: &str,
        event_date: NaiveDate,
        category: EventCategory,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            title: title.to_string(),
            description: String::new(),
            event_date,
            start_time: None,
            end_time: None,
            category,
            color: category.default_color().to_string(),
            reminder_enabled: false,
            reminder_minutes_before: DEFAULT_REMINDER_MINUTES,
            created_at: now,
            updated_at: now,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            parent_event_id: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.parent_event_id {
            Some(parent_id) => EventKind::Instance { parent_id },
            None if self.is_recurring => EventKind::RecurringParent,
            None => EventKind::Standalone,
        }
    }

    /// Id of the row that owns the family this event belongs to.
    pub fn family_root_id(&self) -> i64 {
        self.parent_event_id.unwrap_or(self.id)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "event.title")?;
        validate_max_len(&self.title, MAX_TITLE_LEN, "event.title")?;
        if colors::palette_color(&self.color).is_none() {
            return Err(format!("event.color '{}' is not in the palette", self.color));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end < start {
                return Err("event.end_time must be >= event.start_time".to_string());
            }
        }
        if self.is_recurring && self.parent_event_id.is_some() {
            return Err("event cannot be both recurring and an instance".to_string());
        }
        if self.is_recurring {
            let Some(end_date) = self.recurrence_end_date else {
                return Err("event.recurrence_end_date is required for recurring events".to_string());
            };
            if self.recurrence_pattern.is_none() {
                return Err("event.recurrence_pattern is required for recurring events".to_string());
            }
            if end_date < self.event_date {
                return Err("event.recurrence_end_date must be on or after event.event_date".to_string());
            }
        } else if self.recurrence_pattern.is_some() || self.recurrence_end_date.is_some() {
            return Err("event recurrence settings require is_recurring".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerSession {
    pub id: i64,
    pub user_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub mode: TimerMode,
    pub completed: bool,
}

pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

impl TimerSession {
    pub fn validate(&self) -> Result<(), String> {
        if self.end_time < self.start_time {
            return Err("session.end_time must be >= session.start_time".to_string());
        }
        if self.duration_minutes == 0 {
            return Err("session.duration must be > 0".to_string());
        }
        if self.duration_minutes > MAX_SESSION_MINUTES {
            return Err(format!("session.duration cannot exceed {MAX_SESSION_MINUTES} minutes"));
        }
        Ok(())
    }

    pub fn is_focus(&self) -> bool {
        self.mode == TimerMode::Focus
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginAttempt {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: String,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

pub const MAX_USER_AGENT_LEN: usize = 255;

impl LoginAttempt {
    pub fn new(
        email: &str,
        success: bool,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            user_id: None,
            email: email.trim().to_string(),
            ip_address: ip_address
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned),
            user_agent: user_agent
                .unwrap_or_default()
                .chars()
                .take(MAX_USER_AGENT_LEN)
                .collect(),
            timestamp,
            success,
        }
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_max_len(value: &str, max: usize, field_name: &str) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{field_name} cannot exceed {max} characters"));
    }
    Ok(())
}

/// `HH:MM` on the wire for optional times of day.
mod hhmm {
    use crate::domain::time_parser::parse_time_of_day;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(parse_time_of_day(raw.as_deref()))
    }
}
