use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::extract::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

pub const SECURITY_NOTICE: &str = "This website is secured and undergoes regular security audits in accordance, but not exclusively, with the OWASP Top 10.";

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginAttemptView {
    pub user_id: u64,
    pub username: Option<String>,
    pub failed_attempts: u32,
    pub lockout_until: Option<DateTime<Utc>>,
    pub locked: bool,
}

/// Answer for guessed admin URLs. There is no admin site behind them.
pub async fn security_notice() -> &'static str {
    SECURITY_NOTICE
}

pub async fn list_login_attempts(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Vec<LoginAttemptView>>, AppError> {
    current
        .user
        .require_superuser("Only superusers can view login attempts.")?;

    let now = Utc::now();
    let tracker = state.login_tracker.lock().await;
    let users = state.users.read().await;
    let views = tracker
        .list()
        .into_iter()
        .map(|r| LoginAttemptView {
            user_id: r.user_id,
            username: users.get(r.user_id).map(|u| u.username.clone()),
            failed_attempts: r.failed_attempts,
            lockout_until: r.lockout_until,
            locked: tracker.check_lockout(r.user_id, now).is_locked(),
        })
        .collect();
    Ok(Json(views))
}

pub async fn unlock_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(user_id): Path<u64>,
) -> Result<Json<LoginAttemptView>, AppError> {
    current
        .user
        .require_superuser("Only superusers can unlock accounts.")?;

    let username = state
        .users
        .read()
        .await
        .get(user_id)
        .map(|u| u.username.clone())
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    state.login_tracker.lock().await.record_success(user_id)?;
    tracing::info!(user_id, unlocked_by = current.user.id, "Login attempts reset");

    Ok(Json(LoginAttemptView {
        user_id,
        username: Some(username),
        failed_attempts: 0,
        lockout_until: None,
        locked: false,
    }))
}
