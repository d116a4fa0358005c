//! Expansion of a recurring parent event into its dated instances.

use crate::domain::models::{CalendarEvent, RecurrencePattern};
use chrono::{Days, Months, NaiveDate};

/// Upper bound on generated instances per family (two years of daily events).
pub const MAX_INSTANCES: usize = 730;

/// Dates after `seed` up to and including `end`, one step apart.
///
/// Monthly steps are taken from the seed rather than from the previous
/// occurrence so a 31st keeps landing on the last day of shorter months
/// without drifting.
#[derive(Debug, Clone)]
pub struct Occurrences {
    seed: NaiveDate,
    pattern: RecurrencePattern,
    end: NaiveDate,
    step: u32,
}

impl Occurrences {
    pub fn new(seed: NaiveDate, pattern: RecurrencePattern, end: NaiveDate) -> Self {
        Self {
            seed,
            pattern,
            end,
            step: 0,
        }
    }

    fn occurrence(&self, step: u32) -> Option<NaiveDate> {
        match self.pattern {
            RecurrencePattern::Daily => self.seed.checked_add_days(Days::new(u64::from(step))),
            RecurrencePattern::Weekly => self
                .seed
                .checked_add_days(Days::new(u64::from(step) * 7)),
            RecurrencePattern::Monthly => self.seed.checked_add_months(Months::new(step)),
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let step = self.step.checked_add(1)?;
        let date = self.occurrence(step)?;
        if date > self.end {
            return None;
        }
        self.step = step;
        Some(date)
    }
}

/// All instance dates for a series, rejecting series longer than
/// [`MAX_INSTANCES`].
pub fn instance_dates(
    seed: NaiveDate,
    pattern: RecurrencePattern,
    end: NaiveDate,
) -> Result<Vec<NaiveDate>, String> {
    if end < seed {
        return Err("recurrence_end_date must be on or after event_date".to_string());
    }
    let dates = Occurrences::new(seed, pattern, end)
        .take(MAX_INSTANCES + 1)
        .collect::<Vec<_>>();
    if dates.len() > MAX_INSTANCES {
        return Err(format!(
            "recurrence would create more than {MAX_INSTANCES} instances"
        ));
    }
    Ok(dates)
}

/// Builds the unsaved instances of a recurring parent. Each copies the
/// parent's content and points back at it.
pub fn expand_instances(parent: &CalendarEvent) -> Result<Vec<CalendarEvent>, String> {
    if !parent.is_recurring || parent.parent_event_id.is_some() {
        return Err(format!("event {} is not a recurring parent", parent.id));
    }
    let (Some(pattern), Some(end)) = (parent.recurrence_pattern, parent.recurrence_end_date) else {
        return Err(format!("event {} has incomplete recurrence settings", parent.id));
    };

    let instances = instance_dates(parent.event_date, pattern, end)?
        .into_iter()
        .map(|event_date| CalendarEvent {
            id: 0,
            event_date,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            parent_event_id: Some(parent.id),
            ..parent.clone()
        })
        .collect();
    Ok(instances)
}
