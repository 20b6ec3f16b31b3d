use std::sync::Arc;

use axum::{Json, extract::State as AxumState};
use chrono::Utc;
use records::{Patient, PatientLogin, PatientRegister, Staff, StaffLogin, StaffProfile};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::require;
use crate::{
    auth::{
        CurrentUser, INACTIVE_USER, Principal, PrincipalKind, TokenResponse, issue_token,
        verify_password,
    },
    error::AppError,
    state::State,
    utils::new_id,
};

#[derive(Serialize)]
#[serde(untagged)]
pub enum Profile {
    Patient(Patient),
    Staff(StaffProfile),
}

pub async fn register(
    AxumState(state): AxumState<Arc<State>>,
    Json(payload): Json<PatientRegister>,
) -> Result<Json<TokenResponse<Patient>>, AppError> {
    require(&[
        ("name", &payload.name),
        ("cpf", &payload.cpf),
        ("birth_date", &payload.birth_date),
    ])?;

    let cpf = payload.cpf.trim().to_string();

    if state
        .db
        .find_one::<Patient, _>(|p| p.cpf == cpf)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("CPF já cadastrado"));
    }

    let patient = Patient {
        id: new_id(),
        name: payload.name.trim().to_string(),
        cpf,
        birth_date: payload.birth_date.trim().to_string(),
        phone: String::new(),
        address: String::new(),
        gender: String::new(),
        associate: String::new(),
        company: String::new(),
        created_at: Utc::now(),
    };
    state.db.save(&patient).await?;

    let token = issue_token(&state.config, &patient.id, PrincipalKind::Patient)?;

    info!("Patient registered: {}", patient.id);
    state.hub.emit_to_admin(
        "new_patient",
        json!({
            "id": patient.id,
            "name": patient.name,
            "cpf": patient.cpf,
            "timestamp": Utc::now().to_rfc3339(),
        }),
    );

    Ok(Json(TokenResponse::bearer(token, patient)))
}

pub async fn login(
    AxumState(state): AxumState<Arc<State>>,
    Json(payload): Json<PatientLogin>,
) -> Result<Json<TokenResponse<Patient>>, AppError> {
    let cpf = payload.cpf.trim();
    let birth_date = payload.birth_date.trim();

    let patient = state
        .db
        .find_one::<Patient, _>(|p| p.cpf == cpf && p.birth_date == birth_date)
        .await?
        .ok_or_else(|| AppError::unauthorized("CPF ou data de nascimento inválidos"))?;

    let token = issue_token(&state.config, &patient.id, PrincipalKind::Patient)?;

    Ok(Json(TokenResponse::bearer(token, patient)))
}

pub async fn me(CurrentUser(principal): CurrentUser) -> Json<Profile> {
    Json(match principal {
        Principal::Patient(patient) => Profile::Patient(patient),
        Principal::Staff(staff) => Profile::Staff(staff.profile()),
    })
}

pub async fn staff_login(
    AxumState(state): AxumState<Arc<State>>,
    Json(payload): Json<StaffLogin>,
) -> Result<Json<TokenResponse<StaffProfile>>, AppError> {
    let email = payload.email.trim().to_lowercase();
    let rejected = || AppError::unauthorized("Email ou senha inválidos");

    let staff = state
        .db
        .find_one::<Staff, _>(|s| s.email.to_lowercase() == email)
        .await?
        .ok_or_else(rejected)?;

    if !verify_password(payload.password, staff.password_hash.clone()).await? {
        return Err(rejected());
    }

    if !staff.active {
        return Err(AppError::unauthorized(INACTIVE_USER));
    }

    let token = issue_token(&state.config, &staff.id, PrincipalKind::Staff)?;
    info!("Staff login: {}", staff.email);

    Ok(Json(TokenResponse::bearer(token, staff.profile())))
}
