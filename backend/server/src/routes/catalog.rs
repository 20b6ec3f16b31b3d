//! Units, services and doctors: what patients pick from when booking.
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
};
use records::{
    Doctor, DoctorCreate, DoctorUpdate, PublicService, Service, ServiceCreate, ServiceUpdate,
    Unit, UnitCreate, UnitUpdate,
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{apply, require};
use crate::{auth::StaffUser, error::AppError, state::State, utils::new_id};

const UNIT_NOT_FOUND: &str = "Unidade não encontrada";
const SERVICE_NOT_FOUND: &str = "Serviço não encontrado";
const DOCTOR_NOT_FOUND: &str = "Doutor não encontrado";

#[derive(Debug, Deserialize)]
pub struct DoctorQuery {
    pub unit_id: Option<String>,
}

pub async fn list_units(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Json<Vec<Unit>>, AppError> {
    let mut units = state.db.all::<Unit>().await?;
    units.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(units))
}

pub async fn create_unit(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Json(payload): Json<UnitCreate>,
) -> Result<Json<Unit>, AppError> {
    require(&[("name", &payload.name), ("address", &payload.address)])?;

    let unit = Unit {
        id: new_id(),
        name: payload.name,
        address: payload.address,
        phone: payload.phone,
    };
    state.db.save(&unit).await?;

    Ok(Json(unit))
}

pub async fn update_unit(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<UnitUpdate>,
) -> Result<Json<Unit>, AppError> {
    let mut unit = state
        .db
        .get::<Unit>(&id)
        .await?
        .ok_or_else(|| AppError::not_found(UNIT_NOT_FOUND))?;

    apply!(unit, payload; name, address, phone);

    Ok(Json(state.db.save_and_reload(&unit).await?))
}

pub async fn delete_unit(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.db.remove::<Unit>(&id).await? {
        return Err(AppError::not_found(UNIT_NOT_FOUND));
    }

    Ok(Json(json!({ "message": "Unidade removida" })))
}

async fn sorted_services(state: &State) -> Result<Vec<Service>, AppError> {
    let mut services = state.db.all::<Service>().await?;
    services.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(services)
}

/// Patients never see prices.
pub async fn list_public_services(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Json<Vec<PublicService>>, AppError> {
    let services = sorted_services(&state).await?;

    Ok(Json(services.into_iter().map(PublicService::from).collect()))
}

pub async fn list_services(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
) -> Result<Json<Vec<Service>>, AppError> {
    Ok(Json(sorted_services(&state).await?))
}

pub async fn create_service(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Json(payload): Json<ServiceCreate>,
) -> Result<Json<Service>, AppError> {
    require(&[("name", &payload.name)])?;

    let service = Service {
        id: new_id(),
        name: payload.name,
        description: payload.description,
        duration_minutes: payload.duration_minutes,
        price: payload.price,
    };
    state.db.save(&service).await?;

    Ok(Json(service))
}

pub async fn update_service(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<ServiceUpdate>,
) -> Result<Json<Service>, AppError> {
    let mut service = state
        .db
        .get::<Service>(&id)
        .await?
        .ok_or_else(|| AppError::not_found(SERVICE_NOT_FOUND))?;

    apply!(service, payload; name, description, duration_minutes, price);

    Ok(Json(state.db.save_and_reload(&service).await?))
}

pub async fn delete_service(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.db.remove::<Service>(&id).await? {
        return Err(AppError::not_found(SERVICE_NOT_FOUND));
    }

    Ok(Json(json!({ "message": "Serviço removido" })))
}

async fn sorted_doctors(state: &State, unit_id: Option<&str>) -> Result<Vec<Doctor>, AppError> {
    let mut doctors = state
        .db
        .find::<Doctor, _>(|d| unit_id.is_none_or(|unit| d.unit_id == unit))
        .await?;
    doctors.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(doctors)
}

pub async fn list_doctors(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<DoctorQuery>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    let unit_id = query.unit_id.as_deref().filter(|unit| !unit.is_empty());

    Ok(Json(sorted_doctors(&state, unit_id).await?))
}

pub async fn list_all_doctors(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
) -> Result<Json<Vec<Doctor>>, AppError> {
    Ok(Json(sorted_doctors(&state, None).await?))
}

pub async fn create_doctor(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Json(payload): Json<DoctorCreate>,
) -> Result<Json<Doctor>, AppError> {
    require(&[
        ("name", &payload.name),
        ("unit_id", &payload.unit_id),
        ("cro", &payload.cro),
    ])?;

    let doctor = Doctor {
        id: new_id(),
        name: payload.name,
        specialty: payload.specialty,
        unit_id: payload.unit_id,
        cro: payload.cro,
        phone: payload.phone,
        email: payload.email,
        photo_base64: payload.photo_base64,
        bio: payload.bio,
        available_days: payload.available_days,
    };
    state.db.save(&doctor).await?;

    Ok(Json(doctor))
}

pub async fn update_doctor(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<DoctorUpdate>,
) -> Result<Json<Doctor>, AppError> {
    let mut doctor = state
        .db
        .get::<Doctor>(&id)
        .await?
        .ok_or_else(|| AppError::not_found(DOCTOR_NOT_FOUND))?;

    if payload.photo_base64.is_some() {
        doctor.photo_base64 = payload.photo_base64;
    }

    apply!(doctor, payload; name, specialty, unit_id, cro, phone, email, bio, available_days);

    Ok(Json(state.db.save_and_reload(&doctor).await?))
}

pub async fn delete_doctor(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.db.remove::<Doctor>(&id).await? {
        return Err(AppError::not_found(DOCTOR_NOT_FOUND));
    }

    Ok(Json(json!({ "message": "Doutor removido" })))
}
