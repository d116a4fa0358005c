use crate::application::bootstrap::bootstrap_workspace;
use crate::domain::models::MAX_TITLE_LEN;
use crate::infrastructure::config::AppSettings;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::Database;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const OPERATIONS_LOG: &str = "operations.log";

pub struct AppState {
    workspace_root: PathBuf,
    logs_dir: PathBuf,
    database: Database,
    settings: AppSettings,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        Self::with_lookup(workspace_root, |key| std::env::var(key).ok())
    }

    pub fn with_lookup<F>(workspace_root: PathBuf, lookup: F) -> Result<Self, InfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bootstrap = bootstrap_workspace(&workspace_root, lookup)?;
        Ok(Self {
            workspace_root: bootstrap.workspace_root,
            logs_dir: bootstrap.logs_dir,
            database: Database::new(&bootstrap.database_path),
            settings: bootstrap.settings,
            log_guard: Mutex::new(()),
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn timezone(&self) -> Tz {
        self.settings.timezone
    }

    /// Calendar date of `instant` in the configured timezone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.settings.timezone).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        match error {
            InfraError::Validation { .. }
            | InfraError::NotFound(_)
            | InfraError::Unauthorized
            | InfraError::Conflict(_) => self.log_warn(command, &error.to_string()),
            _ => self.log_error(command, &error.to_string()),
        }
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        tracing::info!(operation = command, "{message}");
        self.append_log("info", command, message);
    }

    pub fn log_warn(&self, command: &str, message: &str) {
        tracing::warn!(operation = command, "{message}");
        self.append_log("warn", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        tracing::error!(operation = command, "{message}");
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join(OPERATIONS_LOG);
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "operation": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

pub(crate) fn parse_date_input(value: &str, field_name: &str) -> Result<NaiveDate, InfraError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| InfraError::validation(field_name, "must be a date formatted YYYY-MM-DD"))
}

pub(crate) fn parse_rfc3339_input(value: &str, field_name: &str) -> Result<DateTime<Utc>, InfraError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| InfraError::validation(field_name, "must be an RFC3339 timestamp"))
}

/// Empty input means "no date".
pub(crate) fn parse_optional_date_input(
    value: Option<&str>,
    field_name: &str,
) -> Result<Option<NaiveDate>, InfraError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => parse_date_input(raw, field_name).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn normalize_title(value: &str, field_name: &str) -> Result<String, InfraError> {
    let title = value.trim();
    if title.is_empty() {
        return Err(InfraError::validation(field_name, "must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(InfraError::validation(
            field_name,
            format!("cannot exceed {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(title.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppState;
    use crate::domain::models::CalendarEvent;
    use crate::infrastructure::account_repository::insert_user;
    use crate::infrastructure::event_repository::list_owned_events;
    use chrono::Utc;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    pub(crate) struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        pub(crate) fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "habitcanvas-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp workspace");
            Self { path }
        }

        pub(crate) fn path(&self) -> &PathBuf {
            &self.path
        }

        pub(crate) fn app_state(&self) -> AppState {
            AppState::with_lookup(self.path.clone(), |_| None).expect("initialize app state")
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    pub(crate) fn create_user(state: &AppState, email: &str) -> i64 {
        state
            .database()
            .write(|connection| insert_user(connection, email, Utc::now()))
            .expect("insert user")
            .id
    }

    /// The root event and its instances, in calendar order.
    pub(crate) fn event_family(state: &AppState, user_id: i64, root_id: i64) -> Vec<CalendarEvent> {
        state
            .database()
            .read(|connection| list_owned_events(connection, user_id, None))
            .expect("list events")
            .into_iter()
            .filter(|event| event.id == root_id || event.parent_event_id == Some(root_id))
            .collect()
    }
}
