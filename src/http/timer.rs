use super::{run_blocking, ApiError, CurrentUser, JsonBody, SharedState};
use crate::application::timer::{record_session_impl, stats_impl, RecordSessionRequest, TimerStats};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
struct StatsResponse {
    success: bool,
    #[serde(flatten)]
    stats: TimerStats,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/timer/sessions", post(record_session))
        .route("/timer/stats", get(stats))
}

async fn record_session(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(request): JsonBody<RecordSessionRequest>,
) -> Result<Json<Value>, ApiError> {
    let recorded = run_blocking(&state, "record_session", move |state| {
        record_session_impl(state, user_id, request)
    })
    .await?;
    Ok(Json(json!({
        "success": true,
        "session": recorded.session,
        "streak": recorded.streak,
    })))
}

async fn stats(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = run_blocking(&state, "timer_stats", move |state| stats_impl(state, user_id)).await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
