//! Account endpoints. Registration and attempt logging are called by the
//! auth layer before a user id exists, so they take no `X-User-Id`.

use super::{run_blocking, ApiError, CurrentUser, JsonBody, QueryParams, SharedState};
use crate::application::accounts::{
    find_user_impl, record_login_attempt_impl, recent_login_attempts_impl, register_impl,
    LoginAttemptRequest, RegisterRequest,
};
use crate::infrastructure::error::InfraError;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
struct AttemptsQuery {
    limit: Option<u32>,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/accounts/register", post(register))
        .route(
            "/accounts/login-attempts",
            post(record_login_attempt).get(recent_login_attempts),
        )
}

async fn register(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = run_blocking(&state, "register", move |state| register_impl(state, request)).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn record_login_attempt(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<LoginAttemptRequest>,
) -> Result<Json<Value>, ApiError> {
    run_blocking(&state, "record_login_attempt", move |state| {
        record_login_attempt_impl(state, request)
    })
    .await?;
    Ok(Json(json!({ "success": true })))
}

/// Attempts made against the current user's email, newest first.
async fn recent_login_attempts(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    QueryParams(query): QueryParams<AttemptsQuery>,
) -> Result<Json<Value>, ApiError> {
    let attempts = run_blocking(&state, "recent_login_attempts", move |state| {
        let user = find_user_impl(state, user_id)?.ok_or(InfraError::Unauthorized)?;
        recent_login_attempts_impl(state, &user.email, query.limit)
    })
    .await?;
    Ok(Json(json!({ "success": true, "attempts": attempts })))
}

#[cfg(test)]
mod tests {
    use crate::application::commands::test_support::TempWorkspace;
    use crate::http::test_support::send;
    use crate::http::SharedState;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn register_then_duplicate_conflicts() {
        let workspace = TempWorkspace::new();
        let state: SharedState = Arc::new(workspace.app_state());
        let payload = json!({ "email": "new@outlook.com", "password": "Welcome#1" });

        let (status, body) = send(&state, Method::POST, "/accounts/register", None, Some(payload.clone())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["user"]["email"], "new@outlook.com");

        let (status, body) = send(&state, Method::POST, "/accounts/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn register_rejects_policy_violations() {
        let workspace = TempWorkspace::new();
        let state: SharedState = Arc::new(workspace.app_state());

        let (status, body) = send(
            &state,
            Method::POST,
            "/accounts/register",
            None,
            Some(json!({ "email": "who@example.com", "password": "Welcome#1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|error| error.starts_with("email")));
    }

    #[tokio::test]
    async fn attempts_are_recorded_and_listed_for_current_user() {
        let workspace = TempWorkspace::new();
        let state: SharedState = Arc::new(workspace.app_state());

        let (_, body) = send(
            &state,
            Method::POST,
            "/accounts/register",
            None,
            Some(json!({ "email": "me@cit.edu", "password": "Welcome#1" })),
        )
        .await;
        let user = body["user"]["id"].as_i64().expect("user id");

        for success in [false, true] {
            let (status, _) = send(
                &state,
                Method::POST,
                "/accounts/login-attempts",
                None,
                Some(json!({ "email": "me@cit.edu", "success": success, "ip_address": "127.0.0.1" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(
            &state,
            Method::GET,
            "/accounts/login-attempts?limit=5",
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let attempts = body["attempts"].as_array().expect("attempts");
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0]["success"], true);
        assert_eq!(attempts[0]["user_id"], user);

        let (status, _) = send(&state, Method::GET, "/accounts/login-attempts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
