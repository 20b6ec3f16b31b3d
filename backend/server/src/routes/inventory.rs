//! Stock items and the movement log behind every quantity change.
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
};
use chrono::Utc;
use records::{
    Doctor, InventoryItem, InventoryItemCreate, InventoryItemUpdate, InventoryMovement,
    MovementCreate, MovementKind,
};
use serde::Deserialize;
use tracing::info;

use super::{apply, require};
use crate::{auth::StaffUser, error::AppError, state::State, utils::new_id};

const ITEM_NOT_FOUND: &str = "Item não encontrado";
const INSUFFICIENT_STOCK: &str = "Quantidade insuficiente em estoque";

#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub item_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<MovementKind>,
    pub doctor_id: Option<String>,
}

impl MovementFilter {
    fn matches(&self, movement: &InventoryMovement) -> bool {
        self.item_id
            .as_deref()
            .is_none_or(|item| item.is_empty() || movement.item_id == item)
            && self.kind.is_none_or(|kind| movement.kind == kind)
            && self
                .doctor_id
                .as_deref()
                .is_none_or(|doctor| doctor.is_empty() || movement.doctor_id.as_deref() == Some(doctor))
    }
}

/// Applies a movement to the stock level, refusing to go below zero.
pub fn apply_movement(quantity: u32, kind: MovementKind, amount: u32) -> Result<u32, AppError> {
    match kind {
        MovementKind::Inbound => Ok(quantity.saturating_add(amount)),
        MovementKind::Outbound => quantity
            .checked_sub(amount)
            .ok_or_else(|| AppError::bad_request(INSUFFICIENT_STOCK)),
    }
}

pub async fn list(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    let mut items = state.db.all::<InventoryItem>().await?;
    items.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(items))
}

pub async fn create(
    AxumState(state): AxumState<Arc<State>>,
    StaffUser(staff): StaffUser,
    Json(payload): Json<InventoryItemCreate>,
) -> Result<Json<InventoryItem>, AppError> {
    require(&[("name", &payload.name), ("unit", &payload.unit)])?;

    let item = InventoryItem {
        id: new_id(),
        name: payload.name,
        quantity: payload.quantity,
        unit: payload.unit,
        min_quantity: payload.min_quantity,
        created_at: Utc::now(),
    };
    state.db.save(&item).await?;

    let movement = InventoryMovement {
        id: new_id(),
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        kind: MovementKind::Inbound,
        quantity: item.quantity,
        doctor_id: None,
        doctor_name: staff.name.clone(),
        notes: "Cadastro inicial".to_string(),
        created_at: Utc::now(),
        created_by: staff.name,
    };
    state.db.save(&movement).await?;

    info!("Inventory item {} created with {} {}", item.name, item.quantity, item.unit);

    Ok(Json(item))
}

pub async fn update(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<InventoryItemUpdate>,
) -> Result<Json<InventoryItem>, AppError> {
    let _guard = state.stock.lock().await;

    let mut item = state
        .db
        .get::<InventoryItem>(&id)
        .await?
        .ok_or_else(|| AppError::not_found(ITEM_NOT_FOUND))?;

    apply!(item, payload; name, quantity, unit, min_quantity);

    Ok(Json(state.db.save_and_reload(&item).await?))
}

pub async fn record_movement(
    AxumState(state): AxumState<Arc<State>>,
    StaffUser(staff): StaffUser,
    Json(payload): Json<MovementCreate>,
) -> Result<Json<InventoryMovement>, AppError> {
    let doctor_name = match payload.doctor_id.as_deref() {
        Some(doctor_id) => state
            .db
            .get::<Doctor>(doctor_id)
            .await?
            .map(|doctor| doctor.name)
            .unwrap_or_default(),
        None => String::new(),
    };

    let _guard = state.stock.lock().await;

    let mut item = state
        .db
        .get::<InventoryItem>(&payload.item_id)
        .await?
        .ok_or_else(|| AppError::not_found(ITEM_NOT_FOUND))?;

    item.quantity = apply_movement(item.quantity, payload.kind, payload.quantity)?;
    state.db.save(&item).await?;

    let movement = InventoryMovement {
        id: new_id(),
        item_id: item.id,
        item_name: item.name,
        kind: payload.kind,
        quantity: payload.quantity,
        doctor_id: payload.doctor_id,
        doctor_name,
        notes: payload.notes.unwrap_or_default(),
        created_at: Utc::now(),
        created_by: staff.name,
    };
    state.db.save(&movement).await?;

    Ok(Json(movement))
}

pub async fn movements(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Query(filter): Query<MovementFilter>,
) -> Result<Json<Vec<InventoryMovement>>, AppError> {
    let mut movements = state
        .db
        .find::<InventoryMovement, _>(|m| filter.matches(m))
        .await?;
    movements.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(movements))
}
