//! HTTP surface.
//!
//! - `/api/...`: public catalog and patient self-service
//! - `/api/admin/...`: staff back office, every handler takes a [`StaffUser`](crate::auth::StaffUser)
//! - `/ws`: realtime notifications
use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    http::Method,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, realtime::ws_handler, state::State};

pub mod appointments;
pub mod auth;
pub mod catalog;
pub mod documents;
pub mod financial;
pub mod inventory;
pub mod patients;
pub mod staff;

/// Copies every present field of an update payload onto the stored document.
macro_rules! apply {
    ($target:expr, $update:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $update.$field {
                $target.$field = value;
            }
        )+
    };
}
pub(crate) use apply;

/// Rejects blank required text fields.
pub(crate) fn require(fields: &[(&str, &str)]) -> Result<(), AppError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(AppError::bad_request(format!("Campo obrigatório: {name}"))),
        None => Ok(()),
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Dental Clinic API", "status": "running" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn admin_routes() -> Router<Arc<State>> {
    Router::new()
        .route("/auth/login", post(auth::staff_login))
        .route("/staff", get(staff::list).post(staff::create))
        .route("/staff/{id}", put(staff::update).delete(staff::remove))
        .route("/units", post(catalog::create_unit))
        .route(
            "/units/{id}",
            put(catalog::update_unit).delete(catalog::delete_unit),
        )
        .route(
            "/services",
            get(catalog::list_services).post(catalog::create_service),
        )
        .route(
            "/services/{id}",
            put(catalog::update_service).delete(catalog::delete_service),
        )
        .route(
            "/doctors",
            get(catalog::list_all_doctors).post(catalog::create_doctor),
        )
        .route(
            "/doctors/{id}",
            put(catalog::update_doctor).delete(catalog::delete_doctor),
        )
        .route("/appointments", get(appointments::list_all))
        .route("/appointments/{id}", put(appointments::update))
        .route("/financial/summary", get(financial::summary))
        .route("/financial/daily", get(financial::daily))
        .route("/inventory", get(inventory::list).post(inventory::create))
        .route("/inventory/movement", post(inventory::record_movement))
        .route("/inventory/movements", get(inventory::movements))
        .route("/inventory/{id}", put(inventory::update))
        .route("/patients", get(patients::list))
        .route("/patients/{id}", get(patients::detail).put(patients::update))
        .route("/document-templates", get(documents::list_templates))
        .route("/document-templates/{kind}", put(documents::update_template))
        .route("/documents/generate", post(documents::generate))
        .route("/documents/generate-pdf", post(documents::generate_pdf))
}

fn api_routes() -> Router<Arc<State>> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/units", get(catalog::list_units))
        .route("/services", get(catalog::list_public_services))
        .route("/doctors", get(catalog::list_doctors))
        .route(
            "/appointments",
            get(appointments::list_own).post(appointments::book),
        )
        .route("/appointments/booked-slots", get(appointments::booked_slots))
        .route("/appointments/reminders", get(appointments::reminders))
        .route("/appointments/{id}", delete(appointments::cancel))
        .nest("/admin", admin_routes())
}

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api", get(root))
        .route("/api/", get(root))
        .nest("/api", api_routes())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
