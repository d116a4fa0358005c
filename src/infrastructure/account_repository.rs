use crate::domain::models::{LoginAttempt, User};
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn map_attempt(row: &Row<'_>) -> rusqlite::Result<LoginAttempt> {
    Ok(LoginAttempt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        email: row.get(2)?,
        ip_address: row.get(3)?,
        user_agent: row.get(4)?,
        timestamp: row.get(5)?,
        success: row.get(6)?,
    })
}

pub fn insert_user(
    connection: &Connection,
    email: &str,
    created_at: DateTime<Utc>,
) -> Result<User, InfraError> {
    connection.execute(
        "INSERT INTO users (email, created_at) VALUES (?1, ?2)",
        params![email, created_at],
    )?;
    Ok(User {
        id: connection.last_insert_rowid(),
        email: email.to_string(),
        created_at,
    })
}

pub fn find_user(connection: &Connection, user_id: i64) -> Result<Option<User>, InfraError> {
    Ok(connection
        .query_row(
            "SELECT id, email, created_at FROM users WHERE id = ?1",
            params![user_id],
            map_user,
        )
        .optional()?)
}

/// Email comparison is case-insensitive through the column collation.
pub fn find_user_by_email(connection: &Connection, email: &str) -> Result<Option<User>, InfraError> {
    Ok(connection
        .query_row(
            "SELECT id, email, created_at FROM users WHERE email = ?1",
            params![email],
            map_user,
        )
        .optional()?)
}

pub fn insert_login_attempt(connection: &Connection, attempt: &LoginAttempt) -> Result<i64, InfraError> {
    connection.execute(
        "INSERT INTO login_attempts (user_id, email, ip_address, user_agent, timestamp, success)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            attempt.user_id,
            attempt.email,
            attempt.ip_address,
            attempt.user_agent,
            attempt.timestamp,
            attempt.success,
        ],
    )?;
    Ok(connection.last_insert_rowid())
}

/// Newest first.
pub fn recent_login_attempts(
    connection: &Connection,
    email: &str,
    limit: u32,
) -> Result<Vec<LoginAttempt>, InfraError> {
    let mut statement = connection.prepare(
        "SELECT id, user_id, email, ip_address, user_agent, timestamp, success
         FROM login_attempts WHERE email = ?1 COLLATE NOCASE
         ORDER BY timestamp DESC, id DESC LIMIT ?2",
    )?;
    let rows = statement.query_map(params![email, limit], map_attempt)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
