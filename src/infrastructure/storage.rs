use crate::domain::models::{Difficulty, EventCategory, RecurrencePattern, TaskCategory, TimerMode};
use crate::infrastructure::error::InfraError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    let connection = open_connection(path)?;
    connection.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

pub fn open_connection(path: &Path) -> Result<Connection, InfraError> {
    let connection = Connection::open(path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(connection)
}

/// Handle to the SQLite file. Every call opens its own connection, so the
/// handle is cheap to clone into blocking workers.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read<T, F>(&self, operation: F) -> Result<T, InfraError>
    where
        F: FnOnce(&Connection) -> Result<T, InfraError>,
    {
        let connection = open_connection(&self.path)?;
        operation(&connection)
    }

    /// Runs `operation` inside one transaction. Any error rolls the whole
    /// operation back.
    pub fn write<T, F>(&self, operation: F) -> Result<T, InfraError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, InfraError>,
    {
        let mut connection = open_connection(&self.path)?;
        let transaction = connection.transaction()?;
        let output = operation(&transaction)?;
        transaction.commit()?;
        Ok(output)
    }
}

macro_rules! text_column {
    ($($kind:ty),+ $(,)?) => {
        $(
            impl ToSql for $kind {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $kind {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    let raw = value.as_str()?;
                    <$kind>::parse(raw).ok_or_else(|| {
                        FromSqlError::Other(
                            format!("unknown {} value '{raw}'", stringify!($kind)).into(),
                        )
                    })
                }
            }
        )+
    };
}

text_column!(TaskCategory, Difficulty, EventCategory, RecurrencePattern, TimerMode);
