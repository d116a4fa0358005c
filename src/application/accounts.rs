use crate::application::commands::AppState;
use crate::domain::models::{LoginAttempt, User};
use crate::domain::validators::{validate_email_domain, validate_password_policy};
use crate::infrastructure::account_repository::{
    find_user, find_user_by_email, insert_login_attempt, insert_user, recent_login_attempts,
};
use crate::infrastructure::error::InfraError;
use chrono::Utc;
use serde::Deserialize;

pub const DEFAULT_ATTEMPT_LIMIT: u32 = 20;
pub const MAX_ATTEMPT_LIMIT: u32 = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginAttemptRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub success: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Validates the credentials and creates the user row. The password itself
/// is only checked against the policy; storing it is the auth layer's job.
pub fn register_impl(state: &AppState, request: RegisterRequest) -> Result<User, InfraError> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(InfraError::validation("email", "must not be empty"));
    }
    validate_email_domain(email).map_err(|message| InfraError::validation("email", message))?;
    validate_password_policy(&request.password)
        .map_err(|message| InfraError::validation("password", message))?;

    let user = state.database().write(|connection| {
        if find_user_by_email(connection, email)?.is_some() {
            return Err(InfraError::Conflict(format!("email {email} is already registered")));
        }
        insert_user(connection, email, Utc::now())
    })?;

    state.log_info("register", &format!("registered user_id={}", user.id));
    Ok(user)
}

pub fn find_user_impl(state: &AppState, user_id: i64) -> Result<Option<User>, InfraError> {
    state.database().read(|connection| find_user(connection, user_id))
}

pub fn record_login_attempt_impl(
    state: &AppState,
    request: LoginAttemptRequest,
) -> Result<LoginAttempt, InfraError> {
    if request.email.trim().is_empty() {
        return Err(InfraError::validation("email", "must not be empty"));
    }
    let mut attempt = LoginAttempt::new(
        &request.email,
        request.success,
        request.ip_address.as_deref(),
        request.user_agent.as_deref(),
        Utc::now(),
    );

    let attempt = state.database().write(|connection| {
        attempt.user_id = find_user_by_email(connection, &attempt.email)?.map(|user| user.id);
        attempt.id = insert_login_attempt(connection, &attempt)?;
        Ok(attempt)
    })?;

    state.log_info(
        "record_login_attempt",
        &format!("attempt_id={} success={}", attempt.id, attempt.success),
    );
    Ok(attempt)
}

pub fn recent_login_attempts_impl(
    state: &AppState,
    email: &str,
    limit: Option<u32>,
) -> Result<Vec<LoginAttempt>, InfraError> {
    let limit = limit.unwrap_or(DEFAULT_ATTEMPT_LIMIT).clamp(1, MAX_ATTEMPT_LIMIT);
    state
        .database()
        .read(|connection| recent_login_attempts(connection, email.trim(), limit))
}
