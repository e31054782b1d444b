use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::extract::CurrentUser;
use crate::error::AppError;
use crate::model::equipment::{Equipment, EquipmentKind, DEFAULT_STATUS};
use crate::state::AppState;

const MAX_STATUS_LEN: usize = 50;

#[derive(Debug, Deserialize)]
pub struct EquipmentQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EquipmentForm {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl EquipmentForm {
    fn into_equipment(self, id: u64) -> Result<Equipment, AppError> {
        let status = self
            .status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS.to_string());
        if status.chars().count() > MAX_STATUS_LEN {
            return Err(AppError::BadRequest(format!(
                "Ensure status has at most {} characters.",
                MAX_STATUS_LEN
            )));
        }

        Ok(Equipment {
            id,
            name: EquipmentKind::from_code(self.name.trim())?,
            description: self.description.filter(|d| !d.trim().is_empty()),
            status,
        })
    }
}

fn not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Equipment {} not found", id))
}

pub async fn list_equipment(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Query(query): Query<EquipmentQuery>,
) -> Json<Vec<Equipment>> {
    let equipment = state.equipment.read().await;
    let items = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => equipment.iter().filter(|e| e.matches(q)).cloned().collect(),
        None => equipment.iter().cloned().collect(),
    };
    Json(items)
}

pub async fn get_equipment(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Equipment>, AppError> {
    state
        .equipment
        .read()
        .await
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn create_equipment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(form): Json<EquipmentForm>,
) -> Result<(StatusCode, Json<Equipment>), AppError> {
    current
        .user
        .require_superuser("Only superusers can add equipment.")?;

    let item = form.into_equipment(0)?;
    let item = state.equipment.write().await.insert(item)?;
    tracing::info!(equipment_id = item.id, name = item.name.code(), "Equipment added");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_equipment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<u64>,
    Json(form): Json<EquipmentForm>,
) -> Result<Json<Equipment>, AppError> {
    current
        .user
        .require_superuser("Only superusers can edit equipment.")?;

    let replacement = form.into_equipment(id)?;
    state
        .equipment
        .write()
        .await
        .update(id, |item| *item = replacement)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn delete_equipment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    current
        .user
        .require_superuser("Only superusers can delete equipment.")?;

    let mut equipment = state.equipment.write().await;
    if equipment.get(id).is_none() {
        return Err(not_found(id));
    }

    // Bookings go first so a failed equipment write never leaves orphans.
    let removed = state
        .bookings
        .write()
        .await
        .retain(|b| b.equipment_id != id)?;
    equipment.remove(id)?;

    tracing::info!(equipment_id = id, removed_bookings = removed, "Equipment deleted");
    Ok(StatusCode::NO_CONTENT)
}
