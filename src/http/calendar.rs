use super::{run_blocking, ApiError, CurrentUser, JsonBody, PathParam, QueryParams, SharedState};
use crate::application::calendar::{
    create_event_impl, delete_event_impl, get_event_impl, list_events_impl, reschedule_event_impl,
    update_event_impl, CreateEventRequest, UpdateEventRequest,
};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
struct MonthQuery {
    year: Option<i32>,
    month: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RescheduleBody {
    #[serde(default)]
    new_date: String,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/calendar/events", get(list_events).post(create_event))
        .route(
            "/calendar/events/{id}",
            get(get_event).post(update_event).delete(delete_event),
        )
        .route("/calendar/events/{id}/delete", post(delete_event))
        .route("/calendar/events/{id}/reschedule", post(reschedule_event))
}

async fn list_events(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    QueryParams(query): QueryParams<MonthQuery>,
) -> Result<Json<Value>, ApiError> {
    let events = run_blocking(&state, "list_events", move |state| {
        list_events_impl(state, user_id, query.year, query.month)
    })
    .await?;
    Ok(Json(json!({ "success": true, "events": events })))
}

async fn create_event(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(request): JsonBody<CreateEventRequest>,
) -> Result<Json<Value>, ApiError> {
    let event = run_blocking(&state, "create_event", move |state| {
        create_event_impl(state, user_id, request)
    })
    .await?;
    Ok(Json(json!({ "success": true, "event": event })))
}

async fn get_event(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(event_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    let event = run_blocking(&state, "get_event", move |state| {
        get_event_impl(state, user_id, event_id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "event": event })))
}

async fn update_event(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(event_id): PathParam<i64>,
    JsonBody(request): JsonBody<UpdateEventRequest>,
) -> Result<Json<Value>, ApiError> {
    let event = run_blocking(&state, "update_event", move |state| {
        update_event_impl(state, user_id, event_id, request)
    })
    .await?;
    Ok(Json(json!({ "success": true, "event": event })))
}

async fn reschedule_event(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(event_id): PathParam<i64>,
    JsonBody(body): JsonBody<RescheduleBody>,
) -> Result<Json<Value>, ApiError> {
    let event = run_blocking(&state, "reschedule_event", move |state| {
        reschedule_event_impl(state, user_id, event_id, &body.new_date)
    })
    .await?;
    Ok(Json(json!({ "success": true, "event": event })))
}

async fn delete_event(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(event_id): PathParam<i64>,
) -> Result<Json<Value>, ApiError> {
    let deleted = run_blocking(&state, "delete_event", move |state| {
        delete_event_impl(state, user_id, event_id)
    })
    .await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

#[cfg(test)]
mod tests {
    use crate::application::commands::test_support::{create_user, TempWorkspace};
    use crate::http::test_support::send;
    use crate::http::SharedState;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    fn shared(workspace: &TempWorkspace) -> SharedState {
        Arc::new(workspace.app_state())
    }

    #[tokio::test]
    async fn recurring_event_lists_family_for_month() {
        let workspace = TempWorkspace::new();
        let state = shared(&workspace);
        let user = create_user(&state, "cal@gmail.com");

        let (status, body) = send(
            &state,
            Method::POST,
            "/calendar/events",
            Some(user),
            Some(json!({
                "title": "Standup",
                "event_date": "2025-03-03",
                "start_time": "9:00 AM",
                "category": "Meeting",
                "is_recurring": true,
                "recurrence_pattern": "weekly",
                "recurrence_end_date": "2025-03-24",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["event"]["start_time"], "09:00");
        assert_eq!(body["event"]["color"], "#10b981");

        let (status, body) = send(
            &state,
            Method::GET,
            "/calendar/events?year=2025&month=3",
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let events = body["events"].as_array().expect("events array");
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|entry| entry["type"] == "event"));
    }

    #[tokio::test]
    async fn invalid_create_is_bad_request() {
        let workspace = TempWorkspace::new();
        let state = shared(&workspace);
        let user = create_user(&state, "cal@gmail.com");

        let (status, body) = send(
            &state,
            Method::POST,
            "/calendar/events",
            Some(user),
            Some(json!({ "title": "  ", "event_date": "2025-03-03" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some_and(|error| error.contains("title")));
    }

    #[tokio::test]
    async fn month_without_year_is_rejected() {
        let workspace = TempWorkspace::new();
        let state = shared(&workspace);
        let user = create_user(&state, "cal@gmail.com");

        let (status, _) = send(&state, Method::GET, "/calendar/events?month=3", Some(user), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn edit_reschedule_and_delete_round_trip() {
        let workspace = TempWorkspace::new();
        let state = shared(&workspace);
        let user = create_user(&state, "cal@gmail.com");

        let (_, created) = send(
            &state,
            Method::POST,
            "/calendar/events",
            Some(user),
            Some(json!({ "title": "Dentist", "event_date": "2025-05-10", "start_time": "14:30" })),
        )
        .await;
        let id = created["event"]["id"].as_i64().expect("event id");

        let (status, body) = send(
            &state,
            Method::POST,
            &format!("/calendar/events/{id}"),
            Some(user),
            Some(json!({ "title": "Dentist checkup" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["title"], "Dentist checkup");

        let (status, body) = send(
            &state,
            Method::POST,
            &format!("/calendar/events/{id}/reschedule"),
            Some(user),
            Some(json!({ "new_date": "2025-05-12" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["event_date"], "2025-05-12");
        assert_eq!(body["event"]["start_time"], "14:30");

        let (status, body) = send(
            &state,
            Method::POST,
            &format!("/calendar/events/{id}/delete"),
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 1);

        let (status, _) = send(
            &state,
            Method::DELETE,
            &format!("/calendar/events/{id}"),
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_users_event_is_not_found() {
        let workspace = TempWorkspace::new();
        let state = shared(&workspace);
        let owner = create_user(&state, "owner@gmail.com");
        let intruder = create_user(&state, "intruder@gmail.com");

        let (_, created) = send(
            &state,
            Method::POST,
            "/calendar/events",
            Some(owner),
            Some(json!({ "title": "Private", "event_date": "2025-05-10" })),
        )
        .await;
        let id = created["event"]["id"].as_i64().expect("event id");

        let (status, _) = send(
            &state,
            Method::GET,
            &format!("/calendar/events/{id}"),
            Some(intruder),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
