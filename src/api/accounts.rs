use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::extract::CurrentUser;
use crate::error::AppError;
use crate::model::profile::{clean_optional, validate_email, Profile};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountView {
    pub profile: Profile,
    pub email: Option<String>,
    pub user_type: String,
    pub company: String,
}

/// Editable account fields. The profile's `company` is not among them.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub work_address: Option<String>,
    pub work_division: Option<String>,
    pub job_role: Option<String>,
}

fn user_type(is_superuser: bool) -> &'static str {
    if is_superuser { "Superuser" } else { "Regular User" }
}

async fn profile_for(state: &AppState, user_id: u64) -> anyhow::Result<Profile> {
    if let Some(profile) = state.profiles.read().await.find(|p| p.user_id == user_id) {
        return Ok(profile.clone());
    }
    state
        .profiles
        .write()
        .await
        .upsert(|p| p.user_id == user_id, || Profile::for_user(user_id), |_| {})
}

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<AccountView>, AppError> {
    let profile = profile_for(&state, current.user.id).await?;
    Ok(Json(AccountView {
        profile,
        email: current.user.email,
        user_type: user_type(current.user.is_superuser).to_string(),
        company: state.company.clone(),
    }))
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(form): Json<AccountForm>,
) -> Result<Json<AccountView>, AppError> {
    let email = clean_optional("email", form.email, 254)?;
    if let Some(email) = &email {
        validate_email(email)?;
    }
    let phone_number = clean_optional("phone_number", form.phone_number, 15)?;
    let work_address = clean_optional("work_address", form.work_address, 255)?;
    let work_division = clean_optional("work_division", form.work_division, 100)?;
    let job_role = clean_optional("job_role", form.job_role, 100)?;

    let user_id = current.user.id;
    let profile = state.profiles.write().await.upsert(
        |p| p.user_id == user_id,
        || Profile::for_user(user_id),
        |p| {
            p.phone_number = phone_number;
            p.work_address = work_address;
            p.work_division = work_division;
            p.job_role = job_role;
        },
    )?;
    let user = state
        .users
        .write()
        .await
        .set_email(user_id, email)?
        .ok_or(AppError::Unauthorized("Session expired or invalid"))?;

    tracing::info!(user_id, "Profile updated");
    Ok(Json(AccountView {
        profile,
        email: user.email,
        user_type: user_type(user.is_superuser).to_string(),
        company: state.company.clone(),
    }))
}
