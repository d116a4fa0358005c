use crate::application::commands::{normalize_title, parse_date_input, AppState};
use crate::domain::colors::{palette_color, resolve_color, TASK_ENTRY_COLOR};
use crate::domain::models::{
    CalendarEvent, Difficulty, EventCategory, EventKind, RecurrencePattern, Task, TaskCategory,
};
use crate::domain::recurrence::{expand_instances, instance_dates};
use crate::domain::time_parser::parse_time_of_day;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_repository::{
    delete_family, delete_instances, find_owned_event, insert_event, list_owned_events,
    propagate_content, update_event, update_event_date,
};
use crate::infrastructure::task_repository::{list_due_tasks, set_due_date_for_linked_event};
use chrono::{Months, NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub event_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub reminder_enabled: Option<bool>,
    pub reminder_minutes_before: Option<i64>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<String>,
}

/// Partial edit. Absent fields keep their value. For the time fields an
/// empty string clears the value and an unparseable one is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub reminder_enabled: Option<bool>,
    pub reminder_minutes_before: Option<i64>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<String>,
}

/// A due-dated task shown on the calendar next to real events.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskEntry {
    pub id: i64,
    pub title: String,
    pub event_date: NaiveDate,
    pub category: TaskCategory,
    pub difficulty: Difficulty,
    pub priority: i32,
    pub completed: bool,
    pub color: &'static str,
}

impl From<Task> for TaskEntry {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            event_date: task.due_date.unwrap_or_default(),
            category: task.category,
            difficulty: task.difficulty,
            priority: task.priority,
            completed: task.completed,
            color: TASK_ENTRY_COLOR,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CalendarEntry {
    Event(CalendarEvent),
    Task(TaskEntry),
}

impl CalendarEntry {
    fn sort_key(&self) -> (NaiveDate, u8) {
        match self {
            Self::Event(event) => (event.event_date, 0),
            Self::Task(task) => (task.event_date, 1),
        }
    }
}

/// What an edit did to the rest of a recurring family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FamilyChange {
    Unchanged,
    Propagated(usize),
    Regenerated(usize),
    Expanded(usize),
    Collapsed(usize),
}

impl FamilyChange {
    pub(crate) fn rows(self) -> usize {
        match self {
            Self::Unchanged => 0,
            Self::Propagated(rows)
            | Self::Regenerated(rows)
            | Self::Expanded(rows)
            | Self::Collapsed(rows) => rows,
        }
    }
}

pub fn create_event_impl(
    state: &AppState,
    user_id: i64,
    request: CreateEventRequest,
) -> Result<CalendarEvent, InfraError> {
    let title = normalize_title(&request.title, "title")?;
    let event_date = parse_date_input(&request.event_date, "event_date")?;
    let category = parse_event_category(request.category.as_deref())?.unwrap_or(EventCategory::Other);
    let explicit_color = parse_color(request.color.as_deref())?;

    let mut event = CalendarEvent::draft(user_id, &title, event_date, category, Utc::now());
    event.description = request.description.as_deref().map(str::trim).unwrap_or_default().to_string();
    event.start_time = parse_time_input(request.start_time.as_deref(), "start_time")?;
    event.end_time = parse_time_input(request.end_time.as_deref(), "end_time")?;
    event.color = resolve_color(category, explicit_color, None, false).to_string();
    if let Some(enabled) = request.reminder_enabled {
        event.reminder_enabled = enabled;
    }
    if let Some(minutes) = request.reminder_minutes_before {
        event.reminder_minutes_before = parse_reminder_minutes(minutes)?;
    }
    if request.is_recurring {
        let pattern = parse_pattern(request.recurrence_pattern.as_deref())?;
        let end_date = parse_date_input(
            request.recurrence_end_date.as_deref().unwrap_or_default(),
            "recurrence_end_date",
        )?;
        instance_dates(event_date, pattern, end_date)
            .map_err(|message| InfraError::validation("recurrence_end_date", message))?;
        event.is_recurring = true;
        event.recurrence_pattern = Some(pattern);
        event.recurrence_end_date = Some(end_date);
    }
    validate_event(&event)?;

    let (event, instances) = state.database().write(|connection| {
        event.id = insert_event(connection, &event)?;
        let instances = if event.is_recurring {
            insert_instances(connection, &event)?
        } else {
            0
        };
        Ok((event, instances))
    })?;

    state.log_info(
        "create_event",
        &format!("created event_id={} instances={instances}", event.id),
    );
    Ok(event)
}

pub fn get_event_impl(state: &AppState, user_id: i64, event_id: i64) -> Result<CalendarEvent, InfraError> {
    state
        .database()
        .read(|connection| find_owned_event(connection, user_id, event_id))?
        .ok_or(InfraError::NotFound("event"))
}

/// Events and due-dated tasks of one month, or of all time when no month
/// is given. Supplying only one of `year` and `month` is rejected.
pub fn list_events_impl(
    state: &AppState,
    user_id: i64,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Vec<CalendarEntry>, InfraError> {
    let range = month_range(year, month)?;
    let (events, tasks) = state.database().read(|connection| {
        Ok((
            list_owned_events(connection, user_id, range)?,
            list_due_tasks(connection, user_id, range)?,
        ))
    })?;

    let mut entries = events
        .into_iter()
        .map(CalendarEntry::Event)
        .chain(tasks.into_iter().map(|task| CalendarEntry::Task(task.into())))
        .collect::<Vec<_>>();
    entries.sort_by_key(CalendarEntry::sort_key);
    Ok(entries)
}

pub fn update_event_impl(
    state: &AppState,
    user_id: i64,
    event_id: i64,
    request: UpdateEventRequest,
) -> Result<CalendarEvent, InfraError> {
    let now = Utc::now();
    let (event, change) = state.database().write(|connection| {
        let original = find_owned_event(connection, user_id, event_id)?
            .ok_or(InfraError::NotFound("event"))?;
        let mut event = original.clone();

        if let Some(title) = request.title.as_deref() {
            event.title = normalize_title(title, "title")?;
        }
        if let Some(description) = request.description.as_deref() {
            event.description = description.trim().to_string();
        }
        event.start_time = apply_time_edit(event.start_time, request.start_time.as_deref());
        event.end_time = apply_time_edit(event.end_time, request.end_time.as_deref());
        if let Some(category) = parse_event_category(request.category.as_deref())? {
            event.category = category;
        }
        let explicit_color = parse_color(request.color.as_deref())?;
        let category_changed = event.category != original.category;
        event.color =
            resolve_color(event.category, explicit_color, Some(&original.color), category_changed)
                .to_string();
        if let Some(enabled) = request.reminder_enabled {
            event.reminder_enabled = enabled;
        }
        if let Some(minutes) = request.reminder_minutes_before {
            event.reminder_minutes_before = parse_reminder_minutes(minutes)?;
        }
        if let Some(raw) = request.event_date.as_deref() {
            event.event_date = parse_date_input(raw, "event_date")?;
        }
        if original.parent_event_id.is_none() {
            apply_recurrence_edit(&mut event, &request)?;
        }
        event.updated_at = now;
        validate_event(&event)?;

        update_event(connection, &event)?;
        let change = sync_family(connection, &original, &event)?;
        if event.event_date != original.event_date {
            set_due_date_for_linked_event(connection, user_id, event.id, event.event_date)?;
        }
        Ok((event, change))
    })?;

    state.log_info(
        "update_event",
        &format!(
            "updated event_id={} family={change:?} rows={}",
            event.id,
            change.rows()
        ),
    );
    Ok(event)
}

/// Moves only the addressed row to `new_date`, keeping its times.
pub fn reschedule_event_impl(
    state: &AppState,
    user_id: i64,
    event_id: i64,
    new_date: &str,
) -> Result<CalendarEvent, InfraError> {
    let new_date = parse_date_input(new_date, "new_date")?;
    let now = Utc::now();
    let event = state.database().write(|connection| {
        let mut event = find_owned_event(connection, user_id, event_id)?
            .ok_or(InfraError::NotFound("event"))?;
        event.event_date = new_date;
        event.updated_at = now;
        validate_event(&event)?;
        update_event_date(connection, user_id, event.id, new_date, now)?;
        set_due_date_for_linked_event(connection, user_id, event.id, new_date)?;
        Ok(event)
    })?;

    state.log_info(
        "reschedule_event",
        &format!("moved event_id={} to {new_date}", event.id),
    );
    Ok(event)
}

/// Deletes the whole family the event belongs to and returns the number of
/// removed rows.
pub fn delete_event_impl(state: &AppState, user_id: i64, event_id: i64) -> Result<usize, InfraError> {
    let deleted = state.database().write(|connection| {
        let event = find_owned_event(connection, user_id, event_id)?
            .ok_or(InfraError::NotFound("event"))?;
        delete_family(connection, user_id, event.family_root_id())
    })?;

    state.log_info(
        "delete_event",
        &format!("deleted event_id={event_id} rows={deleted}"),
    );
    Ok(deleted)
}

/// Brings the family of `event` in line with an edit already written to
/// its own row: content goes to the other members, schedule changes on a
/// parent regenerate its instances.
pub(crate) fn sync_family(
    connection: &Connection,
    original: &CalendarEvent,
    event: &CalendarEvent,
) -> Result<FamilyChange, InfraError> {
    let change = match (original.kind(), event.kind()) {
        (_, EventKind::Instance { parent_id }) => {
            FamilyChange::Propagated(propagate_content(connection, event, parent_id)?)
        }
        (EventKind::RecurringParent, EventKind::RecurringParent) => {
            let schedule_changed = original.event_date != event.event_date
                || original.recurrence_pattern != event.recurrence_pattern
                || original.recurrence_end_date != event.recurrence_end_date;
            if schedule_changed {
                delete_instances(connection, event.user_id, event.id)?;
                FamilyChange::Regenerated(insert_instances(connection, event)?)
            } else {
                FamilyChange::Propagated(propagate_content(connection, event, event.id)?)
            }
        }
        (EventKind::RecurringParent, _) => {
            FamilyChange::Collapsed(delete_instances(connection, event.user_id, event.id)?)
        }
        (_, EventKind::RecurringParent) => FamilyChange::Expanded(insert_instances(connection, event)?),
        _ => FamilyChange::Unchanged,
    };
    Ok(change)
}

fn insert_instances(connection: &Connection, parent: &CalendarEvent) -> Result<usize, InfraError> {
    let instances = expand_instances(parent)
        .map_err(|message| InfraError::validation("recurrence_end_date", message))?;
    for instance in &instances {
        insert_event(connection, instance)?;
    }
    Ok(instances.len())
}

fn apply_recurrence_edit(event: &mut CalendarEvent, request: &UpdateEventRequest) -> Result<(), InfraError> {
    let recurring = request.is_recurring.unwrap_or(event.is_recurring);
    if !recurring {
        event.is_recurring = false;
        event.recurrence_pattern = None;
        event.recurrence_end_date = None;
        return Ok(());
    }

    event.is_recurring = true;
    if let Some(raw) = request.recurrence_pattern.as_deref() {
        event.recurrence_pattern = Some(parse_pattern(Some(raw))?);
    }
    if let Some(raw) = request.recurrence_end_date.as_deref() {
        event.recurrence_end_date = Some(parse_date_input(raw, "recurrence_end_date")?);
    }
    let (Some(pattern), Some(end_date)) = (event.recurrence_pattern, event.recurrence_end_date) else {
        return Err(InfraError::validation(
            "recurrence_pattern",
            "recurring events need a pattern and an end date",
        ));
    };
    instance_dates(event.event_date, pattern, end_date)
        .map_err(|message| InfraError::validation("recurrence_end_date", message))?;
    Ok(())
}

fn validate_event(event: &CalendarEvent) -> Result<(), InfraError> {
    event
        .validate()
        .map_err(|message| InfraError::validation("event", message))
}

fn month_range(
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Option<(NaiveDate, NaiveDate)>, InfraError> {
    match (year, month) {
        (None, None) => Ok(None),
        (Some(year), Some(month)) => {
            let start = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| InfraError::validation("month", "must be between 1 and 12"))?;
            let end = start
                .checked_add_months(Months::new(1))
                .ok_or_else(|| InfraError::validation("year", "is out of range"))?;
            Ok(Some((start, end)))
        }
        _ => Err(InfraError::validation(
            "month",
            "year and month must be supplied together",
        )),
    }
}

fn parse_event_category(value: Option<&str>) -> Result<Option<EventCategory>, InfraError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => EventCategory::parse(raw).map(Some).ok_or_else(|| {
            InfraError::validation(
                "category",
                format!("unknown category '{raw}' (expected School, Personal, Work, Meeting or Other)"),
            )
        }),
        None => Ok(None),
    }
}

fn parse_color(value: Option<&str>) -> Result<Option<&'static str>, InfraError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => palette_color(raw)
            .map(Some)
            .ok_or_else(|| InfraError::validation("color", format!("'{raw}' is not a palette color"))),
        None => Ok(None),
    }
}

fn parse_pattern(value: Option<&str>) -> Result<RecurrencePattern, InfraError> {
    value
        .and_then(RecurrencePattern::parse)
        .ok_or_else(|| InfraError::validation("recurrence_pattern", "must be daily, weekly or monthly"))
}

fn parse_reminder_minutes(value: i64) -> Result<u32, InfraError> {
    u32::try_from(value)
        .map_err(|_| InfraError::validation("reminder_minutes_before", "must be a non-negative number"))
}

fn parse_time_input(value: Option<&str>, field_name: &str) -> Result<Option<NaiveTime>, InfraError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => parse_time_of_day(Some(raw))
            .map(Some)
            .ok_or_else(|| InfraError::validation(field_name, format!("'{raw}' is not a time of day"))),
        None => Ok(None),
    }
}

fn apply_time_edit(current: Option<NaiveTime>, edit: Option<&str>) -> Option<NaiveTime> {
    match edit {
        None => current,
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => parse_time_of_day(Some(raw)).or(current),
    }
}
