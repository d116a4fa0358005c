//! JSON-over-HTTP surface. Every response carries a `success` flag; errors
//! are `{success: false, error}` with a status derived from [`InfraError`].

pub mod accounts;
pub mod calendar;
pub mod tasks;
pub mod timer;

use crate::application::accounts::find_user_impl;
use crate::application::commands::AppState;
use crate::infrastructure::error::InfraError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub type SharedState = Arc<AppState>;

/// Header set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Logs `error` against `operation` and converts it to a response.
    pub fn from_infra(state: &AppState, operation: &str, error: &InfraError) -> Self {
        let message = state.command_error(operation, error);
        Self::new(status_for(error), message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

pub fn status_for(error: &InfraError) -> StatusCode {
    match error {
        InfraError::Validation { .. } => StatusCode::BAD_REQUEST,
        InfraError::NotFound(_) => StatusCode::NOT_FOUND,
        InfraError::Unauthorized => StatusCode::UNAUTHORIZED,
        InfraError::Conflict(_) => StatusCode::CONFLICT,
        InfraError::InvalidConfig(_)
        | InfraError::Sqlite(_)
        | InfraError::Io(_)
        | InfraError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON body whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Runs a blocking application operation on the blocking pool.
pub async fn run_blocking<T, F>(state: &SharedState, operation: &'static str, job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, InfraError> + Send + 'static,
{
    let worker_state = Arc::clone(state);
    match tokio::task::spawn_blocking(move || job(&worker_state)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(ApiError::from_infra(state, operation, &error)),
        Err(join_error) => {
            state.log_error(operation, &format!("worker failed: {join_error}"));
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error",
            ))
        }
    }
}

/// Id of the user named by the auth header. Unknown ids are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let Some(user_id) = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
        else {
            return Err(ApiError::from_infra(state, "authenticate", &InfraError::Unauthorized));
        };

        let user = run_blocking(state, "authenticate", move |state| find_user_impl(state, user_id)).await?;
        match user {
            Some(user) => Ok(Self(user.id)),
            None => Err(ApiError::from_infra(state, "authenticate", &InfraError::Unauthorized)),
        }
    }
}

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(calendar::router())
        .merge(tasks::router())
        .merge(timer::router())
        .merge(accounts::router())
        .fallback(route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "status": "ok" }))
}

async fn route_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "route not found")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{router, SharedState, USER_ID_HEADER};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    pub(crate) async fn send(
        state: &SharedState,
        method: Method,
        uri: &str,
        user_id: Option<i64>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header(USER_ID_HEADER, user_id.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = router(state.clone())
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}
