use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_focus_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// First focus session ever.
    Started,
    /// Another session on the day already counted.
    SameDay,
    /// Session on the day after the last one.
    Extended,
    /// Session after a gap of one or more days.
    Reset,
    /// Session dated before the last counted day; state is left alone.
    Backdated,
}

impl StreakTransition {
    pub fn changed_state(self) -> bool {
        matches!(self, Self::Started | Self::Extended | Self::Reset)
    }
}

impl StreakState {
    pub fn record(&mut self, session_date: NaiveDate) -> StreakTransition {
        let transition = match self.last_focus_date {
            None => {
                self.current_streak = 1;
                self.last_focus_date = Some(session_date);
                StreakTransition::Started
            }
            Some(last) if session_date == last => StreakTransition::SameDay,
            Some(last) if session_date < last => StreakTransition::Backdated,
            Some(last) if last.checked_add_days(Days::new(1)) == Some(session_date) => {
                self.current_streak = self.current_streak.saturating_add(1);
                self.last_focus_date = Some(session_date);
                StreakTransition::Extended
            }
            Some(_) => {
                self.current_streak = 1;
                self.last_focus_date = Some(session_date);
                StreakTransition::Reset
            }
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        transition
    }

    /// The streak as it should be displayed on `today`: a streak whose last
    /// day is before yesterday has lapsed even though nothing reset it yet.
    pub fn current_as_of(&self, today: NaiveDate) -> u32 {
        let Some(last) = self.last_focus_date else {
            return 0;
        };
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        if last >= yesterday {
            self.current_streak
        } else {
            0
        }
    }
}
