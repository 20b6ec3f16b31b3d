//! # Financial aggregation
//!
//! Figures are what was recorded on completed appointments (`paid_value`).
//! Months are bounded by the appointment's own `DD/MM/YYYY` date.
use chrono::Datelike;
use records::{Appointment, AppointmentStatus};
use serde::Serialize;

use crate::utils::parse_date;

#[derive(Debug, Serialize, PartialEq)]
pub struct UnitTotals {
    pub unit_id: String,
    pub unit_name: String,
    pub total_revenue: f64,
    pub total_appointments: usize,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub month: u32,
    pub year: i32,
    pub total_revenue: f64,
    pub total_appointments: usize,
    pub average_ticket: f64,
    pub clinic_breakdown: Vec<UnitTotals>,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub total_revenue: f64,
    pub appointments: Vec<Appointment>,
}

fn in_month(appointment: &Appointment, month: u32, year: i32) -> bool {
    parse_date(&appointment.date).is_some_and(|date| date.month() == month && date.year() == year)
}

/// Per-unit totals keep the order in which units first appear.
pub fn monthly_summary(
    appointments: Vec<Appointment>,
    month: u32,
    year: i32,
    unit_id: Option<&str>,
) -> MonthlySummary {
    let appointments: Vec<Appointment> = appointments
        .into_iter()
        .filter(|a| a.status == AppointmentStatus::Completed)
        .filter(|a| unit_id.is_none_or(|unit| a.unit_id == unit))
        .filter(|a| in_month(a, month, year))
        .collect();

    let mut clinic_breakdown: Vec<UnitTotals> = Vec::new();
    let mut total_revenue = 0.0;

    for appointment in &appointments {
        total_revenue += appointment.paid_value;

        match clinic_breakdown
            .iter_mut()
            .find(|totals| totals.unit_id == appointment.unit_id)
        {
            Some(totals) => {
                totals.total_revenue += appointment.paid_value;
                totals.total_appointments += 1;
            }
            None => clinic_breakdown.push(UnitTotals {
                unit_id: appointment.unit_id.clone(),
                unit_name: if appointment.unit_name.is_empty() {
                    "Sem unidade".to_string()
                } else {
                    appointment.unit_name.clone()
                },
                total_revenue: appointment.paid_value,
                total_appointments: 1,
            }),
        }
    }

    let total_appointments = appointments.len();
    let average_ticket = if total_appointments == 0 {
        0.0
    } else {
        total_revenue / total_appointments as f64
    };

    MonthlySummary {
        month,
        year,
        total_revenue,
        total_appointments,
        average_ticket,
        clinic_breakdown,
        appointments,
    }
}

pub fn daily_summary(appointments: Vec<Appointment>, date: &str) -> DailySummary {
    let appointments: Vec<Appointment> = appointments
        .into_iter()
        .filter(|a| a.status == AppointmentStatus::Completed && a.date == date)
        .collect();

    DailySummary {
        date: date.to_string(),
        total_revenue: appointments.iter().map(|a| a.paid_value).sum(),
        appointments,
    }
}
