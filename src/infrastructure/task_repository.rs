use crate::domain::models::{SubTask, SubtaskProgress, Task};
use crate::infrastructure::error::InfraError;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

const TASK_SELECT: &str = "SELECT t.id, t.user_id, t.title, t.category, t.difficulty, t.completed, \
     t.favorite, t.priority, t.due_date, t.created_at, t.add_to_calendar, t.linked_calendar_event_id, \
     (SELECT COUNT(*) FROM subtasks s WHERE s.task_id = t.id), \
     (SELECT COUNT(*) FROM subtasks s WHERE s.task_id = t.id AND s.completed = 1) \
     FROM tasks t";

const TASK_ORDER: &str = "ORDER BY t.completed ASC, t.favorite DESC, t.priority DESC, \
     t.due_date IS NULL, t.due_date ASC, t.created_at ASC, t.id ASC";

fn map_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let total: u32 = row.get(12)?;
    let completed: u32 = row.get(13)?;
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        difficulty: row.get(4)?,
        completed: row.get(5)?,
        favorite: row.get(6)?,
        priority: row.get(7)?,
        due_date: row.get(8)?,
        created_at: row.get(9)?,
        add_to_calendar: row.get(10)?,
        linked_calendar_event_id: row.get(11)?,
        progress: SubtaskProgress::new(total, completed),
    })
}

fn map_subtask(row: &Row<'_>) -> rusqlite::Result<SubTask> {
    Ok(SubTask {
        id: row.get(0)?,
        task_id: row.get(1)?,
        title: row.get(2)?,
        completed: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert_task(connection: &Connection, task: &Task) -> Result<i64, InfraError> {
    connection.execute(
        "INSERT INTO tasks (
            user_id, title, category, difficulty, completed, favorite, priority, due_date,
            created_at, add_to_calendar, linked_calendar_event_id
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            task.user_id,
            task.title,
            task.category,
            task.difficulty,
            task.completed,
            task.favorite,
            task.priority,
            task.due_date,
            task.created_at,
            task.add_to_calendar,
            task.linked_calendar_event_id,
        ],
    )?;
    Ok(connection.last_insert_rowid())
}

pub fn find_owned_task(
    connection: &Connection,
    user_id: i64,
    task_id: i64,
) -> Result<Option<Task>, InfraError> {
    let sql = format!("{TASK_SELECT} WHERE t.id = ?1 AND t.user_id = ?2");
    Ok(connection
        .query_row(&sql, params![task_id, user_id], map_task)
        .optional()?)
}

pub fn list_tasks(connection: &Connection, user_id: i64) -> Result<Vec<Task>, InfraError> {
    let sql = format!("{TASK_SELECT} WHERE t.user_id = ?1 {TASK_ORDER}");
    let mut statement = connection.prepare(&sql)?;
    let rows = statement.query_map(params![user_id], map_task)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Tasks with a due date, optionally restricted to `[start, end)`.
pub fn list_due_tasks(
    connection: &Connection,
    user_id: i64,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<Task>, InfraError> {
    let tasks = match range {
        Some((start, end)) => {
            let sql = format!(
                "{TASK_SELECT} WHERE t.user_id = ?1 AND t.due_date >= ?2 AND t.due_date < ?3
                 ORDER BY t.due_date, t.id"
            );
            let mut statement = connection.prepare(&sql)?;
            let rows = statement.query_map(params![user_id, start, end], map_task)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let sql = format!(
                "{TASK_SELECT} WHERE t.user_id = ?1 AND t.due_date IS NOT NULL
                 ORDER BY t.due_date, t.id"
            );
            let mut statement = connection.prepare(&sql)?;
            let rows = statement.query_map(params![user_id], map_task)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(tasks)
}

pub fn update_task(connection: &Connection, task: &Task) -> Result<(), InfraError> {
    let changed = connection.execute(
        "UPDATE tasks SET
            title = ?1, category = ?2, difficulty = ?3, completed = ?4, favorite = ?5,
            priority = ?6, due_date = ?7, add_to_calendar = ?8, linked_calendar_event_id = ?9
         WHERE id = ?10 AND user_id = ?11",
        params![
            task.title,
            task.category,
            task.difficulty,
            task.completed,
            task.favorite,
            task.priority,
            task.due_date,
            task.add_to_calendar,
            task.linked_calendar_event_id,
            task.id,
            task.user_id,
        ],
    )?;
    if changed == 0 {
        return Err(InfraError::NotFound("task"));
    }
    Ok(())
}

pub fn delete_task(connection: &Connection, user_id: i64, task_id: i64) -> Result<bool, InfraError> {
    let deleted = connection.execute(
        "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
        params![task_id, user_id],
    )?;
    Ok(deleted > 0)
}

/// Moves the due date of whichever task links to `event_id`.
pub fn set_due_date_for_linked_event(
    connection: &Connection,
    user_id: i64,
    event_id: i64,
    due_date: NaiveDate,
) -> Result<usize, InfraError> {
    let changed = connection.execute(
        "UPDATE tasks SET due_date = ?1 WHERE user_id = ?2 AND linked_calendar_event_id = ?3",
        params![due_date, user_id, event_id],
    )?;
    Ok(changed)
}

pub fn insert_subtask(connection: &Connection, subtask: &SubTask) -> Result<i64, InfraError> {
    connection.execute(
        "INSERT INTO subtasks (task_id, title, completed, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![subtask.task_id, subtask.title, subtask.completed, subtask.created_at],
    )?;
    Ok(connection.last_insert_rowid())
}

pub fn list_subtasks(connection: &Connection, task_id: i64) -> Result<Vec<SubTask>, InfraError> {
    let mut statement = connection.prepare(
        "SELECT id, task_id, title, completed, created_at FROM subtasks
         WHERE task_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = statement.query_map(params![task_id], map_subtask)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Resolves a subtask only when its parent task belongs to `user_id`.
pub fn find_owned_subtask(
    connection: &Connection,
    user_id: i64,
    subtask_id: i64,
) -> Result<Option<SubTask>, InfraError> {
    Ok(connection
        .query_row(
            "SELECT s.id, s.task_id, s.title, s.completed, s.created_at
             FROM subtasks s JOIN tasks t ON t.id = s.task_id
             WHERE s.id = ?1 AND t.user_id = ?2",
            params![subtask_id, user_id],
            map_subtask,
        )
        .optional()?)
}

pub fn update_subtask(connection: &Connection, subtask: &SubTask) -> Result<(), InfraError> {
    let changed = connection.execute(
        "UPDATE subtasks SET title = ?1, completed = ?2 WHERE id = ?3",
        params![subtask.title, subtask.completed, subtask.id],
    )?;
    if changed == 0 {
        return Err(InfraError::NotFound("subtask"));
    }
    Ok(())
}

pub fn delete_subtask(connection: &Connection, subtask_id: i64) -> Result<bool, InfraError> {
    let deleted = connection.execute("DELETE FROM subtasks WHERE id = ?1", params![subtask_id])?;
    Ok(deleted > 0)
}
