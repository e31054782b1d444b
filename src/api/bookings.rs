use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::extract::CurrentUser;
use crate::auth::users::User;
use crate::error::AppError;
use crate::model::booking::{
    default_end_time, default_start_time, Booking, MAX_PROJECT_NUMBER_LEN, MAX_USE_LOCATION_LEN,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingForm {
    pub equipment_id: u64,
    /// Only honoured for superusers booking on someone's behalf.
    pub user_id: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: String,
    pub project_number: String,
    pub use_location: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingList {
    pub bookings: Vec<Booking>,
    pub previous_bookings: Vec<Booking>,
    pub is_superuser: bool,
    pub current_time: DateTime<Utc>,
}

struct BookingFields {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    reason: String,
    project_number: String,
    use_location: String,
}

fn required(field: &str, value: &str, max_len: Option<usize>) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required.", field)));
    }
    if let Some(max_len) = max_len {
        if value.chars().count() > max_len {
            return Err(AppError::BadRequest(format!(
                "Ensure {} has at most {} characters.",
                field, max_len
            )));
        }
    }
    Ok(value.to_string())
}

impl BookingForm {
    fn fields(&self, now: DateTime<Utc>) -> Result<BookingFields, AppError> {
        Ok(BookingFields {
            start_time: self.start_time.unwrap_or_else(|| default_start_time(now)),
            end_time: self.end_time.unwrap_or_else(|| default_end_time(now)),
            reason: required("reason", &self.reason, None)?,
            project_number: required(
                "project_number",
                &self.project_number,
                Some(MAX_PROJECT_NUMBER_LEN),
            )?,
            use_location: required("use_location", &self.use_location, Some(MAX_USE_LOCATION_LEN))?,
        })
    }
}

fn not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Booking {} not found", id))
}

fn visible_to(user: &User, booking: &Booking) -> bool {
    user.is_superuser || booking.user_id == user.id
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Json<BookingList> {
    let now = Utc::now();
    let bookings = state.bookings.read().await;
    let visible: Vec<&Booking> = bookings
        .iter()
        .filter(|b| visible_to(&current.user, b))
        .collect();

    Json(BookingList {
        bookings: visible
            .iter()
            .filter(|b| b.is_upcoming(now))
            .map(|b| (*b).clone())
            .collect(),
        previous_bookings: visible
            .iter()
            .filter(|b| b.is_previous(now))
            .map(|b| (*b).clone())
            .collect(),
        is_superuser: current.user.is_superuser,
        current_time: now,
    })
}

pub async fn previous_bookings(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Json<Vec<Booking>> {
    let now = Utc::now();
    let bookings = state.bookings.read().await;
    Json(
        bookings
            .iter()
            .filter(|b| visible_to(&current.user, b) && b.is_previous(now))
            .cloned()
            .collect(),
    )
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let fields = form.fields(Utc::now())?;

    let user_id = match form.user_id {
        Some(user_id) if current.user.is_superuser => {
            if state.users.read().await.get(user_id).is_none() {
                return Err(AppError::BadRequest(format!("User {} does not exist.", user_id)));
            }
            user_id
        }
        _ => current.user.id,
    };

    let equipment = state.equipment.read().await;
    if equipment.get(form.equipment_id).is_none() {
        return Err(AppError::BadRequest(format!(
            "Equipment {} does not exist.",
            form.equipment_id
        )));
    }

    let booking = state.bookings.write().await.insert(Booking {
        id: 0,
        equipment_id: form.equipment_id,
        user_id,
        start_time: fields.start_time,
        end_time: fields.end_time,
        reason: fields.reason,
        project_number: fields.project_number,
        use_location: fields.use_location,
    })?;

    tracing::info!(
        booking_id = booking.id,
        equipment_id = booking.equipment_id,
        user_id = booking.user_id,
        "Booking created"
    );
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Booking>, AppError> {
    state
        .bookings
        .read()
        .await
        .get(id)
        .filter(|b| visible_to(&current.user, b))
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(form): Json<BookingForm>,
) -> Result<Json<Booking>, AppError> {
    let now = Utc::now();
    let fields = form.fields(now)?;

    let equipment = state.equipment.read().await;
    let mut bookings = state.bookings.write().await;

    let existing = bookings
        .get(id)
        .filter(|b| visible_to(&current.user, b))
        .ok_or_else(|| not_found(id))?;
    if existing.user_id == current.user.id && existing.start_time < now {
        return Err(AppError::BadRequest(
            "You cannot edit a past booking.".to_string(),
        ));
    }
    if equipment.get(form.equipment_id).is_none() {
        return Err(AppError::BadRequest(format!(
            "Equipment {} does not exist.",
            form.equipment_id
        )));
    }

    let reassign_to = match form.user_id {
        Some(user_id) if current.user.is_superuser => {
            if state.users.read().await.get(user_id).is_none() {
                return Err(AppError::BadRequest(format!("User {} does not exist.", user_id)));
            }
            Some(user_id)
        }
        _ => None,
    };

    let updated = bookings.update(id, |b| {
        b.equipment_id = form.equipment_id;
        if let Some(user_id) = reassign_to {
            b.user_id = user_id;
        }
        b.start_time = fields.start_time;
        b.end_time = fields.end_time;
        b.reason = fields.reason;
        b.project_number = fields.project_number;
        b.use_location = fields.use_location;
    })?;

    tracing::info!(booking_id = id, user_id = current.user.id, "Booking updated");
    updated.map(Json).ok_or_else(|| not_found(id))
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    let mut bookings = state.bookings.write().await;
    if bookings.get(id).is_none() {
        return Err(not_found(id));
    }
    current
        .user
        .require_superuser("You do not have permission to delete this booking.")?;

    bookings.remove(id)?;
    tracing::info!(booking_id = id, user_id = current.user.id, "Booking deleted");
    Ok(StatusCode::NO_CONTENT)
}
