use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State as AxumState},
};
use records::{Appointment, Patient, PatientUpdate};
use serde::Serialize;

use super::apply;
use crate::{auth::StaffUser, booking::split_history, error::AppError, state::State};

const NOT_FOUND: &str = "Paciente não encontrado";

#[derive(Debug, Serialize)]
pub struct PatientDetail {
    pub patient: Patient,
    pub history: Vec<Appointment>,
    pub upcoming: Vec<Appointment>,
    pub appointments: Vec<Appointment>,
}

pub async fn list(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
) -> Result<Json<Vec<Patient>>, AppError> {
    let mut patients = state.db.all::<Patient>().await?;
    patients.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(patients))
}

pub async fn detail(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<PatientDetail>, AppError> {
    let patient = state
        .db
        .get::<Patient>(&id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    let mut appointments = state
        .db
        .find::<Appointment, _>(|a| a.user_id == patient.id)
        .await?;
    appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let (history, upcoming) = split_history(&appointments, state.now());

    Ok(Json(PatientDetail {
        patient,
        history,
        upcoming,
        appointments,
    }))
}

pub async fn update(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<PatientUpdate>,
) -> Result<Json<Patient>, AppError> {
    if payload.is_empty() {
        return Err(AppError::bad_request("Nenhum dado para atualizar"));
    }

    let mut patient = state
        .db
        .get::<Patient>(&id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    apply!(patient, payload; name, phone, address, gender, associate, company, birth_date);

    Ok(Json(state.db.save_and_reload(&patient).await?))
}
