use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
};
use chrono::Utc;
use records::{
    Appointment, AppointmentCreate, AppointmentStatus, AppointmentUpdate, Doctor, Service, Unit,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    auth::{CurrentUser, StaffUser},
    booking::{
        booked_times, check_slot, reminders as due_reminders, same_date, slot_fields,
        sort_by_slot_desc,
    },
    error::AppError,
    state::State,
    utils::new_id,
};

const NOT_FOUND: &str = "Agendamento não encontrado";

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub doctor_id: String,
    pub date: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentFilter {
    pub status: Option<String>,
    pub date: Option<String>,
    pub doctor_id: Option<String>,
    pub unit_id: Option<String>,
}

impl AppointmentFilter {
    fn matches(&self, appointment: &Appointment) -> bool {
        fn field_ok(filter: &Option<String>, value: &str) -> bool {
            filter
                .as_deref()
                .is_none_or(|wanted| wanted.is_empty() || wanted == value)
        }

        field_ok(&self.status, appointment.status.as_str())
            && self
                .date
                .as_deref()
                .is_none_or(|wanted| wanted.is_empty() || same_date(wanted, &appointment.date))
            && field_ok(&self.doctor_id, &appointment.doctor_id)
            && field_ok(&self.unit_id, &appointment.unit_id)
    }
}

pub async fn booked_slots(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.db.all::<Appointment>().await?;
    let times = booked_times(&appointments, &query.doctor_id, &query.date);

    Ok(Json(json!({
        "booked_times": times,
        "date": query.date,
        "doctor_id": query.doctor_id,
    })))
}

pub async fn book(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AppointmentCreate>,
) -> Result<Json<Appointment>, AppError> {
    let unit = state.db.get::<Unit>(&payload.unit_id).await?;
    let service = state.db.get::<Service>(&payload.service_id).await?;
    let doctor = state.db.get::<Doctor>(&payload.doctor_id).await?;

    let (Some(unit), Some(service), Some(doctor)) = (unit, service, doctor) else {
        return Err(AppError::bad_request("Dados inválidos"));
    };

    let _guard = state.booking.lock().await;

    let existing = state.db.all::<Appointment>().await?;
    let slot = check_slot(
        &payload.date,
        &payload.time,
        &payload.doctor_id,
        state.now(),
        &existing,
    )?;
    let (date, time) = slot_fields(slot);

    let appointment = Appointment {
        id: new_id(),
        user_id: user.id().to_string(),
        user_name: user.name().to_string(),
        user_cpf: user.cpf().to_string(),
        unit_id: unit.id,
        unit_name: unit.name,
        service_id: service.id,
        service_name: service.name,
        service_price: service.price,
        doctor_id: doctor.id,
        doctor_name: doctor.name,
        date,
        time,
        status: AppointmentStatus::Scheduled,
        notes: payload.notes.unwrap_or_default(),
        paid_value: 0.0,
        created_at: Utc::now(),
        completed_at: None,
    };
    state.db.save(&appointment).await?;

    info!(
        "Appointment {} booked: {} {} with {}",
        appointment.id, appointment.date, appointment.time, appointment.doctor_name
    );
    state.hub.emit_to_admin(
        "new_appointment",
        json!({
            "id": appointment.id,
            "patient_name": appointment.user_name,
            "doctor_name": appointment.doctor_name,
            "unit_name": appointment.unit_name,
            "service_name": appointment.service_name,
            "date": appointment.date,
            "time": appointment.time,
            "timestamp": Utc::now().to_rfc3339(),
        }),
    );

    Ok(Json(appointment))
}

async fn own_appointments(state: &State, user_id: &str) -> Result<Vec<Appointment>, AppError> {
    state
        .db
        .find::<Appointment, _>(|a| a.user_id == user_id)
        .await
}

pub async fn list_own(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let mut appointments = own_appointments(&state, user.id()).await?;
    appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(appointments))
}

pub async fn cancel(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut appointment = state
        .db
        .get::<Appointment>(&id)
        .await?
        .filter(|a| a.user_id == user.id() && a.status != AppointmentStatus::Cancelled)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    appointment.status = AppointmentStatus::Cancelled;
    state.db.save(&appointment).await?;

    info!("Appointment {id} cancelled by patient {}", user.id());
    state.hub.emit_to_admin(
        "appointment_cancelled",
        json!({
            "id": appointment.id,
            "patient_name": appointment.user_name,
            "date": appointment.date,
            "time": appointment.time,
            "timestamp": Utc::now().to_rfc3339(),
        }),
    );

    Ok(Json(json!({ "message": "Agendamento cancelado" })))
}

pub async fn reminders(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, AppError> {
    let appointments = own_appointments(&state, user.id()).await?;

    Ok(Json(json!({ "reminders": due_reminders(&appointments, state.now()) })))
}

pub async fn list_all(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Query(filter): Query<AppointmentFilter>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let mut appointments = state
        .db
        .find::<Appointment, _>(|a| filter.matches(a))
        .await?;
    sort_by_slot_desc(&mut appointments, state.offset());

    Ok(Json(appointments))
}

pub async fn update(
    AxumState(state): AxumState<Arc<State>>,
    StaffUser(staff): StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<AppointmentUpdate>,
) -> Result<Json<Appointment>, AppError> {
    let mut appointment = state
        .db
        .get::<Appointment>(&id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    if let Some(notes) = payload.notes {
        appointment.notes = notes;
    }

    if let Some(paid_value) = payload.paid_value {
        appointment.paid_value = paid_value;
    }

    if let Some(status) = payload.status {
        if status == AppointmentStatus::Completed {
            appointment.paid_value = payload.paid_value.unwrap_or(appointment.service_price);
            appointment.completed_at = Some(Utc::now());
        }

        appointment.status = status;
    }

    let appointment = state.db.save_and_reload(&appointment).await?;

    info!(
        "Appointment {id} updated by {}: {}",
        staff.email, appointment.status
    );
    state.hub.emit_to_admin(
        "appointment_updated",
        json!({
            "id": appointment.id,
            "status": appointment.status,
            "patient_name": appointment.user_name,
            "timestamp": Utc::now().to_rfc3339(),
        }),
    );
    state.hub.emit_to_patient(
        &appointment.user_id,
        "appointment_status_changed",
        json!({
            "id": appointment.id,
            "status": appointment.status,
            "date": appointment.date,
            "time": appointment.time,
        }),
    );

    Ok(Json(appointment))
}
