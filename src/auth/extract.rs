use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use super::users::User;
use crate::error::AppError;
use crate::state::AppState;

pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized("Missing Authorization header"))?;

        let value = header_value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header value"))?;

        let token = value
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized("Expected Bearer token"))?;

        Ok(BearerToken(token.to_string()))
    }
}

/// The logged-in user behind the request's session token.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let user_id = state
            .sessions
            .lock()
            .await
            .validate(&token)
            .ok_or(AppError::Unauthorized("Session expired or invalid"))?;

        let user = state
            .users
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or(AppError::Unauthorized("Session expired or invalid"))?;

        Ok(CurrentUser { user, token })
    }
}
