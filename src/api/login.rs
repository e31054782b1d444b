use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::extract::CurrentUser;
use crate::auth::password::hash_password;
use crate::auth::users::{
    validate_new_password, validate_username, verify_credentials, User, UserInfo,
};
use crate::error::AppError;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password. Please try again.";

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    username: String,
    password1: String,
    password2: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
    /// Unread messages waiting for a superuser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_messages: Option<usize>,
}

async fn check_password(user: &User, password: String) -> anyhow::Result<bool> {
    let user = user.clone();
    tokio::task::spawn_blocking(move || verify_credentials(&user, &password))
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginForm>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state.users.read().await.lookup(&form.username);

    // Unknown usernames are never tracked; they fall through to the generic
    // invalid-credentials answer.
    let Some(user) = user else {
        tracing::info!(username = %form.username, "Login attempt for unknown user");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };

    // The tracker lock is not held across password verification, so parallel
    // guesses can all pass this check. Each failure is still counted and
    // escalates the lock once recorded.
    let now = Utc::now();
    let lock = state.login_tracker.lock().await.check_lockout(user.id, now);
    if let Some(minutes) = lock.remaining_minutes(now) {
        tracing::info!(user_id = user.id, minutes, "Login refused, account locked");
        return Err(AppError::Locked { minutes });
    }

    if !check_password(&user, form.password).await? {
        let record = state
            .login_tracker
            .lock()
            .await
            .record_failure(user.id, Utc::now())?;
        tracing::info!(
            user_id = user.id,
            failed_attempts = record.failed_attempts,
            "Failed login"
        );
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    state.login_tracker.lock().await.record_success(user.id)?;
    let session = state.sessions.lock().await.create(user.id);

    let unread_messages = if user.is_superuser {
        let messages = state.messages.read().await;
        Some(
            messages
                .iter()
                .filter(|m| m.recipient_id == user.id && !m.read)
                .count(),
        )
    } else {
        None
    };

    tracing::info!(user_id = user.id, username = %user.username, "Successfully logged in");
    Ok(Json(LoginResponse {
        token: session.token,
        user: user.info(),
        unread_messages,
    }))
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignupForm>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    validate_username(&form.username)?;
    validate_new_password(&form.username, &form.password1, &form.password2)?;

    let password = form.password1;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))??;

    let user = state
        .users
        .write()
        .await
        .create_user(&form.username, password_hash, false)?;
    let session = state.sessions.lock().await.create(user.id);

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token: session.token,
            user: user.info(),
            unread_messages: None,
        }),
    ))
}

pub async fn logout(State(state): State<Arc<AppState>>, current: CurrentUser) -> StatusCode {
    state.sessions.lock().await.remove(&current.token);
    StatusCode::NO_CONTENT
}
