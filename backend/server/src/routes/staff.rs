use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State as AxumState},
};
use chrono::Utc;
use records::{Staff, StaffCreate, StaffProfile, StaffUpdate};
use serde_json::{Value, json};
use tracing::info;

use super::{apply, require};
use crate::{
    auth::{StaffUser, hash_password},
    error::AppError,
    state::State,
    utils::new_id,
};

const NOT_FOUND: &str = "Colaborador não encontrado";

pub async fn list(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
) -> Result<Json<Vec<StaffProfile>>, AppError> {
    let mut staff = state.db.all::<Staff>().await?;
    staff.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(staff.iter().map(Staff::profile).collect()))
}

pub async fn create(
    AxumState(state): AxumState<Arc<State>>,
    StaffUser(current): StaffUser,
    Json(payload): Json<StaffCreate>,
) -> Result<Json<StaffProfile>, AppError> {
    if !current.is_admin() {
        return Err(AppError::forbidden(
            "Apenas administradores podem criar colaboradores",
        ));
    }

    require(&[
        ("name", &payload.name),
        ("email", &payload.email),
        ("password", &payload.password),
    ])?;

    let email = payload.email.trim().to_lowercase();

    if state
        .db
        .find_one::<Staff, _>(|s| s.email.to_lowercase() == email)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("Email já cadastrado"));
    }

    let staff = Staff {
        id: new_id(),
        name: payload.name.trim().to_string(),
        email,
        password_hash: hash_password(payload.password, state.config.bcrypt_cost).await?,
        role: payload.role,
        permissions: payload.permissions,
        active: true,
        created_at: Utc::now(),
    };
    state.db.save(&staff).await?;

    info!("Staff {} created by {}", staff.email, current.email);

    Ok(Json(staff.profile()))
}

pub async fn update(
    AxumState(state): AxumState<Arc<State>>,
    StaffUser(current): StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<StaffUpdate>,
) -> Result<Json<StaffProfile>, AppError> {
    let is_self = current.id == id;

    if !current.is_admin() && !(is_self && !payload.touches_privileges()) {
        return Err(AppError::forbidden("Sem permissão"));
    }

    let mut staff = state
        .db
        .get::<Staff>(&id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    if let Some(email) = &payload.email {
        let email = email.trim().to_lowercase();

        if state
            .db
            .find_one::<Staff, _>(|s| s.id != id && s.email.to_lowercase() == email)
            .await?
            .is_some()
        {
            return Err(AppError::bad_request("Email já cadastrado"));
        }

        staff.email = email;
    }

    if let Some(password) = payload.password {
        staff.password_hash = hash_password(password, state.config.bcrypt_cost).await?;
    }

    apply!(staff, payload; name, role, permissions, active);

    let staff = state.db.save_and_reload(&staff).await?;

    Ok(Json(staff.profile()))
}

pub async fn remove(
    AxumState(state): AxumState<Arc<State>>,
    StaffUser(current): StaffUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !current.is_admin() {
        return Err(AppError::forbidden(
            "Apenas administradores podem remover colaboradores",
        ));
    }

    if !state.db.remove::<Staff>(&id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    info!("Staff {id} removed by {}", current.email);

    Ok(Json(json!({ "message": "Colaborador removido" })))
}
