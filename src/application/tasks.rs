use crate::application::commands::{normalize_title, parse_optional_date_input, AppState};
use crate::application::task_sync::{delete_linked_event, sync_linked_event, SyncOutcome};
use crate::domain::models::{Difficulty, SubTask, SubtaskProgress, Task, TaskCategory};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::task_repository::{
    delete_subtask, delete_task, find_owned_subtask, find_owned_task, insert_subtask, insert_task,
    list_subtasks, list_tasks, update_subtask, update_task,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub priority: Option<i32>,
    pub due_date: Option<String>,
    pub add_to_calendar: Option<bool>,
}

/// Partial edit. An empty `due_date` clears the date.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub priority: Option<i32>,
    pub due_date: Option<String>,
    pub add_to_calendar: Option<bool>,
    pub completed: Option<bool>,
    pub favorite: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubtaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

pub fn create_task_impl(
    state: &AppState,
    user_id: i64,
    request: CreateTaskRequest,
) -> Result<Task, InfraError> {
    let mut task = Task {
        id: 0,
        user_id,
        title: normalize_title(&request.title, "title")?,
        category: parse_task_category(request.category.as_deref())?.unwrap_or(TaskCategory::Personal),
        difficulty: parse_difficulty(request.difficulty.as_deref())?.unwrap_or(Difficulty::Medium),
        completed: false,
        favorite: false,
        priority: request.priority.unwrap_or(0),
        due_date: parse_optional_date_input(request.due_date.as_deref(), "due_date")?,
        created_at: Utc::now(),
        add_to_calendar: request.add_to_calendar.unwrap_or(false),
        linked_calendar_event_id: None,
        progress: SubtaskProgress::default(),
    };
    validate_task(&task)?;

    let now = task.created_at;
    let (task, outcome) = state.database().write(|connection| {
        task.id = insert_task(connection, &task)?;
        let sync_requested = task.add_to_calendar;
        let outcome = sync_linked_event(connection, &mut task, sync_requested, now)?;
        if outcome != SyncOutcome::Unchanged {
            update_task(connection, &task)?;
        }
        Ok((task, outcome))
    })?;

    state.log_info(
        "create_task",
        &format!("created task_id={} sync={outcome:?}", task.id),
    );
    Ok(task)
}

pub fn list_tasks_impl(state: &AppState, user_id: i64) -> Result<Vec<Task>, InfraError> {
    state.database().read(|connection| list_tasks(connection, user_id))
}

pub fn get_task_impl(state: &AppState, user_id: i64, task_id: i64) -> Result<Task, InfraError> {
    state
        .database()
        .read(|connection| require_task(connection, user_id, task_id))
}

pub fn update_task_impl(
    state: &AppState,
    user_id: i64,
    task_id: i64,
    request: UpdateTaskRequest,
) -> Result<Task, InfraError> {
    let now = Utc::now();
    let (task, outcome) = state.database().write(|connection| {
        let mut task = require_task(connection, user_id, task_id)?;

        if let Some(title) = request.title.as_deref() {
            task.title = normalize_title(title, "title")?;
        }
        if let Some(category) = parse_task_category(request.category.as_deref())? {
            task.category = category;
        }
        if let Some(difficulty) = parse_difficulty(request.difficulty.as_deref())? {
            task.difficulty = difficulty;
        }
        if let Some(priority) = request.priority {
            task.priority = priority;
        }
        if request.due_date.is_some() {
            task.due_date = parse_optional_date_input(request.due_date.as_deref(), "due_date")?;
        }
        if let Some(completed) = request.completed {
            task.completed = completed;
        }
        if let Some(favorite) = request.favorite {
            task.favorite = favorite;
        }
        if let Some(add_to_calendar) = request.add_to_calendar {
            task.add_to_calendar = add_to_calendar;
        }
        validate_task(&task)?;

        let sync_requested = task.add_to_calendar;
        let outcome = sync_linked_event(connection, &mut task, sync_requested, now)?;
        update_task(connection, &task)?;
        Ok((require_task(connection, user_id, task_id)?, outcome))
    })?;

    state.log_info(
        "update_task",
        &format!("updated task_id={} sync={outcome:?}", task.id),
    );
    Ok(task)
}

/// Deletes the linked event family first, then the task and its subtasks.
pub fn delete_task_impl(state: &AppState, user_id: i64, task_id: i64) -> Result<(), InfraError> {
    let removed_events = state.database().write(|connection| {
        let task = require_task(connection, user_id, task_id)?;
        let removed_events = delete_linked_event(connection, &task)?;
        if !delete_task(connection, user_id, task_id)? {
            return Err(InfraError::NotFound("task"));
        }
        Ok(removed_events)
    })?;

    state.log_info(
        "delete_task",
        &format!("deleted task_id={task_id} events={removed_events}"),
    );
    Ok(())
}

pub fn toggle_task_complete_impl(state: &AppState, user_id: i64, task_id: i64) -> Result<Task, InfraError> {
    let task = state.database().write(|connection| {
        let mut task = require_task(connection, user_id, task_id)?;
        task.completed = !task.completed;
        update_task(connection, &task)?;
        Ok(task)
    })?;
    state.log_info(
        "toggle_task_complete",
        &format!("task_id={task_id} completed={}", task.completed),
    );
    Ok(task)
}

pub fn toggle_task_favorite_impl(state: &AppState, user_id: i64, task_id: i64) -> Result<Task, InfraError> {
    let task = state.database().write(|connection| {
        let mut task = require_task(connection, user_id, task_id)?;
        task.favorite = !task.favorite;
        update_task(connection, &task)?;
        Ok(task)
    })?;
    state.log_info(
        "toggle_task_favorite",
        &format!("task_id={task_id} favorite={}", task.favorite),
    );
    Ok(task)
}

pub fn list_subtasks_impl(state: &AppState, user_id: i64, task_id: i64) -> Result<Vec<SubTask>, InfraError> {
    state.database().read(|connection| {
        require_task(connection, user_id, task_id)?;
        list_subtasks(connection, task_id)
    })
}

pub fn create_subtask_impl(
    state: &AppState,
    user_id: i64,
    task_id: i64,
    title: &str,
) -> Result<SubTask, InfraError> {
    let mut subtask = SubTask {
        id: 0,
        task_id,
        title: normalize_title(title, "title")?,
        completed: false,
        created_at: Utc::now(),
    };
    let subtask = state.database().write(|connection| {
        require_task(connection, user_id, task_id)?;
        subtask.id = insert_subtask(connection, &subtask)?;
        Ok(subtask)
    })?;
    state.log_info(
        "create_subtask",
        &format!("created subtask_id={} task_id={task_id}", subtask.id),
    );
    Ok(subtask)
}

pub fn update_subtask_impl(
    state: &AppState,
    user_id: i64,
    subtask_id: i64,
    request: UpdateSubtaskRequest,
) -> Result<SubTask, InfraError> {
    let subtask = state.database().write(|connection| {
        let mut subtask = require_subtask(connection, user_id, subtask_id)?;
        if let Some(title) = request.title.as_deref() {
            subtask.title = normalize_title(title, "title")?;
        }
        if let Some(completed) = request.completed {
            subtask.completed = completed;
        }
        subtask
            .validate()
            .map_err(|message| InfraError::validation("subtask", message))?;
        update_subtask(connection, &subtask)?;
        Ok(subtask)
    })?;
    state.log_info("update_subtask", &format!("updated subtask_id={subtask_id}"));
    Ok(subtask)
}

pub fn toggle_subtask_impl(state: &AppState, user_id: i64, subtask_id: i64) -> Result<SubTask, InfraError> {
    let subtask = state.database().write(|connection| {
        let mut subtask = require_subtask(connection, user_id, subtask_id)?;
        subtask.completed = !subtask.completed;
        update_subtask(connection, &subtask)?;
        Ok(subtask)
    })?;
    state.log_info(
        "toggle_subtask",
        &format!("subtask_id={subtask_id} completed={}", subtask.completed),
    );
    Ok(subtask)
}

pub fn delete_subtask_impl(state: &AppState, user_id: i64, subtask_id: i64) -> Result<(), InfraError> {
    state.database().write(|connection| {
        require_subtask(connection, user_id, subtask_id)?;
        delete_subtask(connection, subtask_id)
    })?;
    state.log_info("delete_subtask", &format!("deleted subtask_id={subtask_id}"));
    Ok(())
}

fn require_task(connection: &Connection, user_id: i64, task_id: i64) -> Result<Task, InfraError> {
    find_owned_task(connection, user_id, task_id)?.ok_or(InfraError::NotFound("task"))
}

fn require_subtask(connection: &Connection, user_id: i64, subtask_id: i64) -> Result<SubTask, InfraError> {
    find_owned_subtask(connection, user_id, subtask_id)?.ok_or(InfraError::NotFound("subtask"))
}

fn validate_task(task: &Task) -> Result<(), InfraError> {
    task.validate()
        .map_err(|message| InfraError::validation("task", message))
}

fn parse_task_category(value: Option<&str>) -> Result<Option<TaskCategory>, InfraError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => TaskCategory::parse(raw).map(Some).ok_or_else(|| {
            InfraError::validation(
                "category",
                format!("unknown category '{raw}' (expected School, Personal or Work)"),
            )
        }),
        None => Ok(None),
    }
}

fn parse_difficulty(value: Option<&str>) -> Result<Option<Difficulty>, InfraError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => Difficulty::parse(raw).map(Some).ok_or_else(|| {
            InfraError::validation(
                "difficulty",
                format!("unknown difficulty '{raw}' (expected Easy, Medium or Hard)"),
            )
        }),
        None => Ok(None),
    }
}
