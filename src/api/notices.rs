use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::extract::CurrentUser;
use crate::error::AppError;
use crate::model::notice::Notice;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NoticeForm {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Home {
    pub notice: Option<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_messages: Option<usize>,
}

impl NoticeForm {
    fn text(self) -> Result<String, AppError> {
        let message = self.message.trim().to_string();
        if message.is_empty() {
            return Err(AppError::BadRequest("message is required.".to_string()));
        }
        Ok(message)
    }
}

pub async fn home(State(state): State<Arc<AppState>>, current: CurrentUser) -> Json<Home> {
    let notice = state.notices.read().await.last().cloned();
    let unread_messages = if current.user.is_superuser {
        let messages = state.messages.read().await;
        Some(
            messages
                .iter()
                .filter(|m| m.recipient_id == current.user.id && !m.read)
                .count(),
        )
    } else {
        None
    };
    Json(Home {
        notice,
        unread_messages,
    })
}

pub async fn create_notice(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(form): Json<NoticeForm>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    current
        .user
        .require_superuser("Only superusers can post notices.")?;

    let now = Utc::now();
    let notice = state.notices.write().await.insert(Notice {
        id: 0,
        message: form.text()?,
        created_at: now,
        updated_at: now,
        created_by: Some(current.user.id),
    })?;
    tracing::info!(notice_id = notice.id, user_id = current.user.id, "Notice created");
    Ok((StatusCode::CREATED, Json(notice)))
}

pub async fn get_notice(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Option<Notice>>, AppError> {
    current
        .user
        .require_superuser("Only superusers can manage notices.")?;
    Ok(Json(state.notices.read().await.last().cloned()))
}

/// Edits the latest notice, creating one when there is none.
pub async fn update_notice(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(form): Json<NoticeForm>,
) -> Result<Json<Notice>, AppError> {
    current
        .user
        .require_superuser("Only superusers can manage notices.")?;

    let message = form.text()?;
    let now = Utc::now();
    let editor = current.user.id;

    let mut notices = state.notices.write().await;
    let notice = match notices.last().map(|n| n.id) {
        Some(id) => notices.update(id, |n| {
            n.message = message;
            n.updated_at = now;
            n.created_by = Some(editor);
        })?,
        None => Some(notices.insert(Notice {
            id: 0,
            message,
            created_at: now,
            updated_at: now,
            created_by: Some(editor),
        })?),
    }
    .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;

    tracing::info!(notice_id = notice.id, user_id = editor, "Notice updated");
    Ok(Json(notice))
}

pub async fn remove_notices(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<StatusCode, AppError> {
    current
        .user
        .require_superuser("Only superusers can manage notices.")?;

    let removed = state.notices.write().await.retain(|_| false)?;
    tracing::info!(removed, user_id = current.user.id, "Notices removed");
    Ok(StatusCode::NO_CONTENT)
}
