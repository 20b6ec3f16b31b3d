//! # Booking rules
//!
//! One slot is one doctor at one date and time. A slot is taken while any
//! appointment on it is not cancelled. Slots are compared in clinic local time,
//! by value rather than by spelling: `9:00` and `09:00` are the same slot.
use std::cmp::Reverse;

use chrono::{DateTime, Duration, FixedOffset};
use records::{Appointment, AppointmentStatus};
use serde::Serialize;

use crate::{
    error::AppError,
    utils::{format_date, format_time, parse_date, parse_slot, parse_time},
};

pub const PAST_SLOT: &str = "Não é possível agendar em horários passados";
pub const SLOT_TAKEN: &str = "Este horário já está ocupado para o profissional selecionado";
pub const MALFORMED_SLOT: &str = "Data ou horário inválido";

/// Validates a requested slot against the clock and the doctor's agenda.
///
/// Returns the slot instant; store it through [`slot_fields`] so every
/// appointment carries the same spelling.
pub fn check_slot(
    date: &str,
    time: &str,
    doctor_id: &str,
    now: DateTime<FixedOffset>,
    existing: &[Appointment],
) -> Result<DateTime<FixedOffset>, AppError> {
    let slot = parse_slot(date, time, *now.offset())
        .ok_or_else(|| AppError::bad_request(MALFORMED_SLOT))?;

    if slot < now {
        return Err(AppError::bad_request(PAST_SLOT));
    }

    if occupies(existing, doctor_id, date, time) {
        return Err(AppError::bad_request(SLOT_TAKEN));
    }

    Ok(slot)
}

/// Canonical `DD/MM/YYYY` and `HH:MM` of a slot instant.
pub fn slot_fields(slot: DateTime<FixedOffset>) -> (String, String) {
    (format_date(slot.date_naive()), format_time(slot.time()))
}

/// Compares two `DD/MM/YYYY` strings by value, or verbatim when either is malformed.
pub fn same_date(a: &str, b: &str) -> bool {
    match (parse_date(a), parse_date(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

fn same_time(a: &str, b: &str) -> bool {
    match (parse_time(a), parse_time(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

fn occupies(existing: &[Appointment], doctor_id: &str, date: &str, time: &str) -> bool {
    existing.iter().any(|appointment| {
        appointment.doctor_id == doctor_id
            && appointment.status != AppointmentStatus::Cancelled
            && same_date(&appointment.date, date)
            && same_time(&appointment.time, time)
    })
}

/// Taken times of a doctor's day as `HH:MM`, sorted and without repeats.
pub fn booked_times(appointments: &[Appointment], doctor_id: &str, date: &str) -> Vec<String> {
    let mut times: Vec<String> = appointments
        .iter()
        .filter(|a| {
            a.doctor_id == doctor_id
                && a.status != AppointmentStatus::Cancelled
                && same_date(&a.date, date)
        })
        .map(|a| parse_time(&a.time).map_or_else(|| a.time.trim().to_string(), format_time))
        .collect();

    times.sort();
    times.dedup();
    times
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Reminder {
    pub id: String,
    pub date: String,
    pub time: String,
    pub doctor_name: String,
    pub service_name: String,
    pub unit_name: String,
}

/// Scheduled appointments starting within the next 24 hours, soonest first.
pub fn reminders(appointments: &[Appointment], now: DateTime<FixedOffset>) -> Vec<Reminder> {
    let horizon = now + Duration::hours(24);

    let mut due: Vec<(DateTime<FixedOffset>, &Appointment)> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled)
        .filter_map(|a| parse_slot(&a.date, &a.time, *now.offset()).map(|slot| (slot, a)))
        .filter(|(slot, _)| now < *slot && *slot <= horizon)
        .collect();

    due.sort_by_key(|(slot, _)| *slot);

    due.into_iter()
        .map(|(_, a)| Reminder {
            id: a.id.clone(),
            date: a.date.clone(),
            time: a.time.clone(),
            doctor_name: a.doctor_name.clone(),
            service_name: a.service_name.clone(),
            unit_name: a.unit_name.clone(),
        })
        .collect()
}

/// Splits a patient's appointments into `(history, upcoming)`, keeping order.
pub fn split_history(
    appointments: &[Appointment],
    now: DateTime<FixedOffset>,
) -> (Vec<Appointment>, Vec<Appointment>) {
    appointments.iter().cloned().partition(|a| {
        a.status.is_closed()
            || parse_slot(&a.date, &a.time, *now.offset()).is_none_or(|slot| slot < now)
    })
}

/// Most recent slot first; unparsable dates sink to the end.
pub fn sort_by_slot_desc(appointments: &mut [Appointment], offset: FixedOffset) {
    appointments.sort_by_cached_key(|a| Reverse(parse_slot(&a.date, &a.time, offset)));
}
