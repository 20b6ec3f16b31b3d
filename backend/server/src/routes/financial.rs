use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State as AxumState},
};
use chrono::Datelike;
use records::Appointment;
use serde::Deserialize;

use crate::{
    auth::StaffUser,
    error::AppError,
    financial::{DailySummary, MonthlySummary, daily_summary, monthly_summary},
    state::State,
};

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub unit_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: String,
}

/// Month and year default to the current month on the clinic clock.
pub async fn summary(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<MonthlySummary>, AppError> {
    let today = state.now();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    if !(1..=12).contains(&month) {
        return Err(AppError::bad_request("Mês inválido"));
    }

    let unit_id = query.unit_id.as_deref().filter(|unit| !unit.is_empty());
    let appointments = state.db.all::<Appointment>().await?;

    Ok(Json(monthly_summary(appointments, month, year, unit_id)))
}

pub async fn daily(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Query(query): Query<DailyQuery>,
) -> Result<Json<DailySummary>, AppError> {
    let appointments = state.db.all::<Appointment>().await?;

    Ok(Json(daily_summary(appointments, &query.date)))
}
