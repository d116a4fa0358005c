use crate::domain::models::{TimerMode, TimerSession};
use crate::domain::streak::StreakState;
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub fn insert_session(connection: &Connection, session: &TimerSession) -> Result<i64, InfraError> {
    connection.execute(
        "INSERT INTO timer_sessions (user_id, start_time, end_time, duration_minutes, mode, completed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            session.user_id,
            session.start_time,
            session.end_time,
            session.duration_minutes,
            session.mode,
            session.completed,
        ],
    )?;
    Ok(connection.last_insert_rowid())
}

pub fn load_streak(connection: &Connection, user_id: i64) -> Result<StreakState, InfraError> {
    let streak = connection
        .query_row(
            "SELECT current_streak, longest_streak, last_focus_date FROM user_streaks WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(StreakState {
                    current_streak: row.get(0)?,
                    longest_streak: row.get(1)?,
                    last_focus_date: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(streak.unwrap_or_default())
}

pub fn save_streak(connection: &Connection, user_id: i64, streak: &StreakState) -> Result<(), InfraError> {
    connection.execute(
        "INSERT INTO user_streaks (user_id, current_streak, longest_streak, last_focus_date)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
           current_streak = excluded.current_streak,
           longest_streak = excluded.longest_streak,
           last_focus_date = excluded.last_focus_date",
        params![
            user_id,
            streak.current_streak,
            streak.longest_streak,
            streak.last_focus_date,
        ],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusTotals {
    pub sessions: i64,
    pub minutes: i64,
}

pub fn focus_totals(connection: &Connection, user_id: i64) -> Result<FocusTotals, InfraError> {
    let totals = connection.query_row(
        "SELECT COUNT(*), COALESCE(SUM(duration_minutes), 0) FROM timer_sessions
         WHERE user_id = ?1 AND mode = ?2",
        params![user_id, TimerMode::Focus],
        |row| {
            Ok(FocusTotals {
                sessions: row.get(0)?,
                minutes: row.get(1)?,
            })
        },
    )?;
    Ok(totals)
}

/// `(end_time, duration_minutes)` of focus sessions ending at or after
/// `since`, oldest first.
pub fn focus_sessions_since(
    connection: &Connection,
    user_id: i64,
    since: DateTime<Utc>,
) -> Result<Vec<(DateTime<Utc>, u32)>, InfraError> {
    let mut statement = connection.prepare(
        "SELECT end_time, duration_minutes FROM timer_sessions
         WHERE user_id = ?1 AND mode = ?2 AND end_time >= ?3
         ORDER BY end_time",
    )?;
    let rows = statement.query_map(params![user_id, TimerMode::Focus, since], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
