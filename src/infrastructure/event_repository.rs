use crate::domain::models::CalendarEvent;
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

const EVENT_COLUMNS: &str = "id, user_id, title, description, event_date, start_time, end_time, \
     category, color, reminder_enabled, reminder_minutes_before, created_at, updated_at, \
     is_recurring, recurrence_pattern, recurrence_end_date, parent_event_id";

fn map_event(row: &Row<'_>) -> rusqlite::Result<CalendarEvent> {
    Ok(CalendarEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        event_date: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        category: row.get(7)?,
        color: row.get(8)?,
        reminder_enabled: row.get(9)?,
        reminder_minutes_before: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        is_recurring: row.get(13)?,
        recurrence_pattern: row.get(14)?,
        recurrence_end_date: row.get(15)?,
        parent_event_id: row.get(16)?,
    })
}

pub fn insert_event(connection: &Connection, event: &CalendarEvent) -> Result<i64, InfraError> {
    connection.execute(
        "INSERT INTO calendar_events (
            user_id, title, description, event_date, start_time, end_time, category, color,
            reminder_enabled, reminder_minutes_before, created_at, updated_at,
            is_recurring, recurrence_pattern, recurrence_end_date, parent_event_id
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            event.user_id,
            event.title,
            event.description,
            event.event_date,
            event.start_time,
            event.end_time,
            event.category,
            event.color,
            event.reminder_enabled,
            event.reminder_minutes_before,
            event.created_at,
            event.updated_at,
            event.is_recurring,
            event.recurrence_pattern,
            event.recurrence_end_date,
            event.parent_event_id,
        ],
    )?;
    Ok(connection.last_insert_rowid())
}

pub fn find_owned_event(
    connection: &Connection,
    user_id: i64,
    event_id: i64,
) -> Result<Option<CalendarEvent>, InfraError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM calendar_events WHERE id = ?1 AND user_id = ?2");
    Ok(connection
        .query_row(&sql, params![event_id, user_id], map_event)
        .optional()?)
}

/// Events owned by `user_id`, optionally restricted to `[start, end)`,
/// ordered by date then start time.
pub fn list_owned_events(
    connection: &Connection,
    user_id: i64,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<CalendarEvent>, InfraError> {
    let events = match range {
        Some((start, end)) => {
            let sql = format!(
                "SELECT {EVENT_COLUMNS} FROM calendar_events
                 WHERE user_id = ?1 AND event_date >= ?2 AND event_date < ?3
                 ORDER BY event_date, start_time, id"
            );
            let mut statement = connection.prepare(&sql)?;
            let rows = statement.query_map(params![user_id, start, end], map_event)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let sql = format!(
                "SELECT {EVENT_COLUMNS} FROM calendar_events
                 WHERE user_id = ?1
                 ORDER BY event_date, start_time, id"
            );
            let mut statement = connection.prepare(&sql)?;
            let rows = statement.query_map(params![user_id], map_event)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(events)
}

/// Writes every mutable column of an existing row.
pub fn update_event(connection: &Connection, event: &CalendarEvent) -> Result<(), InfraError> {
    let changed = connection.execute(
        "UPDATE calendar_events SET
            title = ?1, description = ?2, event_date = ?3, start_time = ?4, end_time = ?5,
            category = ?6, color = ?7, reminder_enabled = ?8, reminder_minutes_before = ?9,
            updated_at = ?10, is_recurring = ?11, recurrence_pattern = ?12,
            recurrence_end_date = ?13
         WHERE id = ?14 AND user_id = ?15",
        params![
            event.title,
            event.description,
            event.event_date,
            event.start_time,
            event.end_time,
            event.category,
            event.color,
            event.reminder_enabled,
            event.reminder_minutes_before,
            event.updated_at,
            event.is_recurring,
            event.recurrence_pattern,
            event.recurrence_end_date,
            event.id,
            event.user_id,
        ],
    )?;
    if changed == 0 {
        return Err(InfraError::NotFound("event"));
    }
    Ok(())
}

/// Copies the shared content of `source` onto every other member of the
/// family rooted at `root_id`. Dates are left alone.
pub fn propagate_content(
    connection: &Connection,
    source: &CalendarEvent,
    root_id: i64,
) -> Result<usize, InfraError> {
    let changed = connection.execute(
        "UPDATE calendar_events SET
            title = ?1, description = ?2, start_time = ?3, end_time = ?4, category = ?5,
            color = ?6, reminder_enabled = ?7, reminder_minutes_before = ?8, updated_at = ?9
         WHERE user_id = ?10 AND (id = ?11 OR parent_event_id = ?11) AND id != ?12",
        params![
            source.title,
            source.description,
            source.start_time,
            source.end_time,
            source.category,
            source.color,
            source.reminder_enabled,
            source.reminder_minutes_before,
            source.updated_at,
            source.user_id,
            root_id,
            source.id,
        ],
    )?;
    Ok(changed)
}

pub fn update_event_date(
    connection: &Connection,
    user_id: i64,
    event_id: i64,
    event_date: NaiveDate,
    updated_at: DateTime<Utc>,
) -> Result<(), InfraError> {
    let changed = connection.execute(
        "UPDATE calendar_events SET event_date = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
        params![event_date, updated_at, event_id, user_id],
    )?;
    if changed == 0 {
        return Err(InfraError::NotFound("event"));
    }
    Ok(())
}

/// Deletes the root row and all of its instances, returning how many rows
/// were removed. Instances go first because cascaded deletes are not
/// counted by SQLite.
pub fn delete_family(connection: &Connection, user_id: i64, root_id: i64) -> Result<usize, InfraError> {
    let instances = delete_instances(connection, user_id, root_id)?;
    let root = connection.execute(
        "DELETE FROM calendar_events WHERE user_id = ?1 AND id = ?2",
        params![user_id, root_id],
    )?;
    Ok(instances + root)
}

pub fn delete_instances(connection: &Connection, user_id: i64, parent_id: i64) -> Result<usize, InfraError> {
    let deleted = connection.execute(
        "DELETE FROM calendar_events WHERE user_id = ?1 AND parent_event_id = ?2",
        params![user_id, parent_id],
    )?;
    Ok(deleted)
}
