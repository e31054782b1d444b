use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::extract::CurrentUser;
use crate::error::AppError;
use crate::model::message::{
    generate_confirmation_number, sort_newest_first, Message, DEFAULT_SUBJECT, MAX_SUBJECT_LEN,
};
use crate::model::profile::clean_optional;
use crate::state::AppState;

const RESPONSE_SUBJECT: &str = "New response to your message";

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub subject: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct InboxForm {
    #[serde(default)]
    pub replied_messages: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Inbox {
    pub unsettled_messages: Vec<Message>,
    pub settled_messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseForm {
    pub response: String,
}

fn not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Message {} not found", id))
}

async fn received_by(state: &AppState, user_id: u64) -> Vec<Message> {
    let mut messages: Vec<Message> = state
        .messages
        .read()
        .await
        .iter()
        .filter(|m| m.recipient_id == user_id)
        .cloned()
        .collect();
    sort_newest_first(&mut messages);
    messages
}

pub async fn contact(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    if current.user.email.is_none() {
        return Err(AppError::BadRequest(
            "Please add an email address to your account before contacting us.".to_string(),
        ));
    }

    let subject = clean_optional("subject", form.subject, MAX_SUBJECT_LEN)?
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    let content = form.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::BadRequest("content is required.".to_string()));
    }

    let recipient_id = state
        .users
        .read()
        .await
        .first_superuser()
        .map(|u| u.id)
        .ok_or_else(|| AppError::BadRequest("No admin found to receive the message.".to_string()))?;

    let mut messages = state.messages.write().await;
    let mut confirmation_number = generate_confirmation_number();
    while messages
        .find(|m| m.confirmation_number == confirmation_number)
        .is_some()
    {
        confirmation_number = generate_confirmation_number();
    }

    let message = messages.insert(Message {
        id: 0,
        subject,
        content,
        sender_id: current.user.id,
        recipient_id,
        confirmation_number,
        response: None,
        responded_by: None,
        read: false,
        created_at: Utc::now(),
    })?;

    tracing::info!(
        message_id = message.id,
        sender_id = message.sender_id,
        recipient_id,
        confirmation_number = %message.confirmation_number,
        "Contact message stored"
    );
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Json<Vec<Message>> {
    Json(received_by(&state, current.user.id).await)
}

pub async fn admin_messages(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Vec<Message>>, AppError> {
    current
        .user
        .require_superuser("Only superusers can view admin messages.")?;
    Ok(Json(received_by(&state, current.user.id).await))
}

pub async fn inbox(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Inbox>, AppError> {
    current
        .user
        .require_superuser("Only superusers can view the inbox.")?;

    // Shared by every superuser, whoever the recipient was.
    let mut messages: Vec<Message> = state.messages.read().await.iter().cloned().collect();
    sort_newest_first(&mut messages);
    let (settled_messages, unsettled_messages): (Vec<Message>, Vec<Message>) =
        messages.into_iter().partition(|m| m.read);
    Ok(Json(Inbox {
        unsettled_messages,
        settled_messages,
    }))
}

pub async fn settle_messages(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(form): Json<InboxForm>,
) -> Result<Json<Inbox>, AppError> {
    current
        .user
        .require_superuser("Only superusers can manage the inbox.")?;

    let ids: HashSet<u64> = form.replied_messages.into_iter().collect();
    let responder = current.user.id;
    let settled = state.messages.write().await.update_where(
        |m| ids.contains(&m.id),
        |m| {
            m.read = true;
            m.responded_by = Some(responder);
        },
    )?;
    tracing::info!(user_id = responder, settled, "Inbox messages marked as read");

    inbox(State(state), current).await
}

pub async fn get_message(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Message>, AppError> {
    current
        .user
        .require_superuser("Only superusers can respond to messages.")?;
    state
        .messages
        .read()
        .await
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn respond_to_message(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(form): Json<ResponseForm>,
) -> Result<Json<Message>, AppError> {
    current
        .user
        .require_superuser("Only superusers can respond to messages.")?;

    let response = form.response.trim().to_string();
    if response.is_empty() {
        return Err(AppError::BadRequest("response is required.".to_string()));
    }

    let responder = current.user.id;
    let message = state
        .messages
        .write()
        .await
        .update(id, |m| {
            m.response = Some(response);
            m.responded_by = Some(responder);
            m.read = true;
        })?
        .ok_or_else(|| not_found(id))?;

    let sender = state.users.read().await.get(message.sender_id).cloned();
    match sender.as_ref().and_then(|u| u.email.as_deref()) {
        Some(email) => {
            let body = format!(
                "Your message (confirmation {}) has received a response:\n\n{}",
                message.confirmation_number,
                message.response.as_deref().unwrap_or_default()
            );
            state.mailer.send(email, RESPONSE_SUBJECT, &body);
        }
        None => tracing::warn!(
            message_id = message.id,
            sender_id = message.sender_id,
            "Sender has no email address, response not mailed"
        ),
    }

    Ok(Json(message))
}
