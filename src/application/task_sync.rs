//! Keeps a task's linked calendar event in step with the task.

use crate::application::calendar::sync_family;
use crate::domain::models::{CalendarEvent, EventCategory, Task};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_repository::{
    delete_family, find_owned_event, insert_event, update_event,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub const TASK_EVENT_DESCRIPTION: &str = "Task due date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing to do, or sync was requested without a due date.
    Unchanged,
    /// The link was cleared; the event itself is kept.
    Unlinked(i64),
    Created(i64),
    Updated(i64),
}

/// Brings `task.linked_calendar_event_id` and the linked event in line with
/// the task. The caller persists the task afterwards.
pub fn sync_linked_event(
    connection: &Connection,
    task: &mut Task,
    sync_requested: bool,
    now: DateTime<Utc>,
) -> Result<SyncOutcome, InfraError> {
    if !sync_requested {
        return Ok(match task.linked_calendar_event_id.take() {
            Some(event_id) => SyncOutcome::Unlinked(event_id),
            None => SyncOutcome::Unchanged,
        });
    }
    let Some(due_date) = task.due_date else {
        return Ok(SyncOutcome::Unchanged);
    };

    let category = EventCategory::from(task.category);
    let linked = match task.linked_calendar_event_id {
        Some(event_id) => find_owned_event(connection, task.user_id, event_id)?,
        None => None,
    };

    if let Some(original) = linked {
        let mut event = original.clone();
        if event.category != category {
            event.category = category;
            event.color = category.default_color().to_string();
        }
        event.title = task.title.clone();
        event.event_date = due_date;
        // A series moved past its own end keeps its length.
        if let Some(end_date) = event.recurrence_end_date.filter(|end_date| *end_date < due_date) {
            let shift = due_date.signed_duration_since(original.event_date);
            event.recurrence_end_date = Some(end_date.checked_add_signed(shift).unwrap_or(due_date));
        }
        event.updated_at = now;
        validate_linked_event(&event)?;
        update_event(connection, &event)?;
        sync_family(connection, &original, &event)?;
        return Ok(SyncOutcome::Updated(event.id));
    }

    let mut event = CalendarEvent::draft(task.user_id, &task.title, due_date, category, now);
    event.description = TASK_EVENT_DESCRIPTION.to_string();
    validate_linked_event(&event)?;
    let event_id = insert_event(connection, &event)?;
    task.linked_calendar_event_id = Some(event_id);
    Ok(SyncOutcome::Created(event_id))
}

/// Removes the linked event together with any family it belongs to.
/// Returns the number of deleted event rows.
pub fn delete_linked_event(connection: &Connection, task: &Task) -> Result<usize, InfraError> {
    let Some(event_id) = task.linked_calendar_event_id else {
        return Ok(0);
    };
    let Some(event) = find_owned_event(connection, task.user_id, event_id)? else {
        return Ok(0);
    };
    delete_family(connection, task.user_id, event.family_root_id())
}

fn validate_linked_event(event: &CalendarEvent) -> Result<(), InfraError> {
    event
        .validate()
        .map_err(|message| InfraError::validation("event", message))
}
