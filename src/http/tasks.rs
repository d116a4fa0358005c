use super::{run_blocking, ApiError, CurrentUser, JsonBody, PathParam, SharedState};
use crate::application::tasks::{
    create_subtask_impl, create_task_impl, delete_subtask_impl, delete_task_impl, get_task_impl,
    list_subtasks_impl, list_tasks_impl, toggle_subtask_impl, toggle_task_complete_impl,
    toggle_task_favorite_impl, update_subtask_impl, update_task_impl, CreateTaskRequest,
    UpdateSubtaskRequest, UpdateTaskRequest,
};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct CreateSubtaskBody {
    #[serde(default)]
    title: String,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).post(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/delete", post(delete_task))
        .route("/tasks/{id}/toggle_complete", post(toggle_complete))
        .route("/tasks/{id}/toggle_favorite", post(toggle_favorite))
        .route("/tasks/{id}/subtasks", get(list_subtasks).post(create_subtask))
        .route("/subtasks/{id}", post(update_subtask).delete(delete_subtask))
        .route("/subtasks/{id}/toggle", post(toggle_subtask))
}

async fn list_tasks(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let tasks = run_blocking(&state, "list_tasks", move |state| list_tasks_impl(state, user_id)).await?;
    Ok(Json(json!({ "success": true, "tasks": tasks })))
}

async fn create_task(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(request): JsonBody<CreateTaskRequest>,
) -> Result<Json<Value>, ApiError> {
    let task = run_blocking(&state, "create_task", move |state| {
        create_task_impl(state, user_id, request)
    })
    .await?;
    Ok(Json(json!({ "success": true, "task": task })))
}

async fn get_task(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(task_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    let task = run_blocking(&state, "get_task", move |state| get_task_impl(state, user_id, task_id)).await?;
    Ok(Json(json!({ "success": true, "task": task })))
}

async fn update_task(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(task_id): PathParam<i64>,
    JsonBody(request): JsonBody<UpdateTaskRequest>,
) -> Result<Json<Value>, ApiError> {
    let task = run_blocking(&state, "update_task", move |state| {
        update_task_impl(state, user_id, task_id, request)
    })
    .await?;
    Ok(Json(json!({ "success": true, "task": task })))
}

async fn delete_task(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(task_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    run_blocking(&state, "delete_task", move |state| delete_task_impl(state, user_id, task_id)).await?;
    Ok(Json(json!({ "success": true })))
}

async fn toggle_complete(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(task_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    let task = run_blocking(&state, "toggle_task_complete", move |state| {
        toggle_task_complete_impl(state, user_id, task_id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "task": task })))
}

async fn toggle_favorite(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(task_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    let task = run_blocking(&state, "toggle_task_favorite", move |state| {
        toggle_task_favorite_impl(state, user_id, task_id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "task": task })))
}

async fn list_subtasks(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(task_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    let subtasks = run_blocking(&state, "list_subtasks", move |state| {
        list_subtasks_impl(state, user_id, task_id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "subtasks": subtasks })))
}

async fn create_subtask(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(task_id): PathParam<i64>,
    JsonBody(body): JsonBody<CreateSubtaskBody>,
) -> Result<Json<Value>, ApiError> {
    let subtask = run_blocking(&state, "create_subtask", move |state| {
        create_subtask_impl(state, user_id, task_id, &body.title)
    })
    .await?;
    Ok(Json(json!({ "success": true, "subtask": subtask })))
}

async fn update_subtask(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(subtask_id): PathParam<i64>,
    JsonBody(request): JsonBody<UpdateSubtaskRequest>,
) -> Result<Json<Value>, ApiError> {
    let subtask = run_blocking(&state, "update_subtask", move |state| {
        update_subtask_impl(state, user_id, subtask_id, request)
    })
    .await?;
    Ok(Json(json!({ "success": true, "subtask": subtask })))
}

async fn toggle_subtask(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(subtask_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    let subtask = run_blocking(&state, "toggle_subtask", move |state| {
        toggle_subtask_impl(state, user_id, subtask_id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "subtask": subtask })))
}

async fn delete_subtask(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(subtask_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    run_blocking(&state, "delete_subtask", move |state| {
        delete_subtask_impl(state, user_id, subtask_id)
    })
    .await?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::application::commands::test_support::{create_user, TempWorkspace};
    use crate::http::test_support::send;
    use crate::http::SharedState;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn task_with_calendar_sync_shows_on_calendar() {
        let workspace = TempWorkspace::new();
        let state: SharedState = Arc::new(workspace.app_state());
        let user = create_user(&state, "tasks@gmail.com");

        let (status, body) = send(
            &state,
            Method::POST,
            "/tasks",
            Some(user),
            Some(json!({
                "title": "Essay",
                "category": "School",
                "due_date": "2025-04-02",
                "add_to_calendar": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let event_id = body["task"]["linked_calendar_event_id"]
            .as_i64()
            .expect("linked event");

        let (status, body) = send(
            &state,
            Method::GET,
            &format!("/calendar/events/{event_id}"),
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["event_date"], "2025-04-02");
        assert_eq!(body["event"]["title"], "Essay");
    }

    #[tokio::test]
    async fn subtask_progress_and_toggles() {
        let workspace = TempWorkspace::new();
        let state: SharedState = Arc::new(workspace.app_state());
        let user = create_user(&state, "tasks@gmail.com");

        let (_, created) = send(&state, Method::POST, "/tasks", Some(user), Some(json!({ "title": "Move" }))).await;
        let task_id = created["task"]["id"].as_i64().expect("task id");

        let mut subtask_ids = Vec::new();
        for title in ["Boxes", "Truck", "Keys"] {
            let (status, body) = send(
                &state,
                Method::POST,
                &format!("/tasks/{task_id}/subtasks"),
                Some(user),
                Some(json!({ "title": title })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            subtask_ids.push(body["subtask"]["id"].as_i64().expect("subtask id"));
        }

        let (status, body) = send(
            &state,
            Method::POST,
            &format!("/subtasks/{}/toggle", subtask_ids[0]),
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subtask"]["completed"], true);

        let (_, body) = send(&state, Method::GET, &format!("/tasks/{task_id}"), Some(user), None).await;
        assert_eq!(body["task"]["subtask_total"], 3);
        assert_eq!(body["task"]["subtask_completed"], 1);
        assert_eq!(body["task"]["progress_percent"], 33);

        let (status, _) = send(
            &state,
            Method::DELETE,
            &format!("/subtasks/{}", subtask_ids[2]),
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(
            &state,
            Method::GET,
            &format!("/tasks/{task_id}/subtasks"),
            Some(user),
            None,
        )
        .await;
        assert_eq!(body["subtasks"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn toggles_and_delete() {
        let workspace = TempWorkspace::new();
        let state: SharedState = Arc::new(workspace.app_state());
        let user = create_user(&state, "tasks@gmail.com");

        let (_, created) = send(&state, Method::POST, "/tasks", Some(user), Some(json!({ "title": "Read" }))).await;
        let task_id = created["task"]["id"].as_i64().expect("task id");

        let (_, body) = send(
            &state,
            Method::POST,
            &format!("/tasks/{task_id}/toggle_complete"),
            Some(user),
            None,
        )
        .await;
        assert_eq!(body["task"]["completed"], true);

        let (_, body) = send(
            &state,
            Method::POST,
            &format!("/tasks/{task_id}/toggle_favorite"),
            Some(user),
            None,
        )
        .await;
        assert_eq!(body["task"]["favorite"], true);

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("/tasks/{task_id}/delete"),
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&state, Method::GET, &format!("/tasks/{task_id}"), Some(user), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn subtasks_of_other_users_are_not_found() {
        let workspace = TempWorkspace::new();
        let state: SharedState = Arc::new(workspace.app_state());
        let owner = create_user(&state, "owner@gmail.com");
        let intruder = create_user(&state, "intruder@gmail.com");

        let (_, created) = send(&state, Method::POST, "/tasks", Some(owner), Some(json!({ "title": "Mine" }))).await;
        let task_id = created["task"]["id"].as_i64().expect("task id");

        let (status, _) = send(
            &state,
            Method::POST,
            &format!("/tasks/{task_id}/subtasks"),
            Some(intruder),
            Some(json!({ "title": "Sneaky" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
