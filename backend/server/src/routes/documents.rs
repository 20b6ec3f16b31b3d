use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State as AxumState},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use records::{Doctor, DocumentRequest, DocumentTemplate, Patient, TemplateKind, TemplateUpdate, Unit};
use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::info;

use crate::{
    auth::StaffUser,
    documents::{Context, pdf_filename, render},
    error::AppError,
    pdf::render_pdf,
    state::State,
};

const TEMPLATE_NOT_FOUND: &str = "Template não encontrado";

#[derive(Debug, Serialize)]
pub struct GeneratedDocument {
    pub content: String,
    pub template_type: TemplateKind,
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_cro: String,
    pub generated_at: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedPdf {
    pub pdf_base64: String,
    pub filename: String,
}

pub async fn list_templates(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
) -> Result<Json<Vec<DocumentTemplate>>, AppError> {
    let mut templates = state.db.all::<DocumentTemplate>().await?;
    templates.sort_by_key(|t| TemplateKind::ALL.iter().position(|kind| *kind == t.kind));

    Ok(Json(templates))
}

pub async fn update_template(
    AxumState(state): AxumState<Arc<State>>,
    StaffUser(staff): StaffUser,
    Path(kind): Path<String>,
    Json(payload): Json<TemplateUpdate>,
) -> Result<Json<DocumentTemplate>, AppError> {
    let kind = TemplateKind::parse(&kind).ok_or_else(|| AppError::not_found(TEMPLATE_NOT_FOUND))?;

    let mut template = state
        .db
        .get::<DocumentTemplate>(kind.as_str())
        .await?
        .ok_or_else(|| AppError::not_found(TEMPLATE_NOT_FOUND))?;

    template.content = payload.content;
    template.updated_at = Utc::now();

    info!("Template {kind} updated by {}", staff.email);

    Ok(Json(state.db.save_and_reload(&template).await?))
}

/// Template, patient and doctor loaded for one generation request.
struct Sources {
    template: DocumentTemplate,
    patient: Patient,
    doctor: Doctor,
    unit: Option<Unit>,
}

impl Sources {
    async fn load(state: &State, request: &DocumentRequest) -> Result<Self, AppError> {
        let template = state
            .db
            .get::<DocumentTemplate>(request.template_type.as_str())
            .await?
            .ok_or_else(|| AppError::not_found(TEMPLATE_NOT_FOUND))?;

        let patient = state.db.get::<Patient>(&request.patient_id).await?;
        let doctor = state.db.get::<Doctor>(&request.doctor_id).await?;

        let (Some(patient), Some(doctor)) = (patient, doctor) else {
            return Err(AppError::not_found("Paciente ou doutor não encontrado"));
        };

        let unit = state.db.get::<Unit>(&doctor.unit_id).await?;

        Ok(Self {
            template,
            patient,
            doctor,
            unit,
        })
    }

    fn render(&self, state: &State, request: &DocumentRequest) -> String {
        let context = Context {
            patient: &self.patient,
            doctor: &self.doctor,
            unit: self.unit.as_ref(),
            clinic_name: &state.config.clinic_name,
            city: &state.config.clinic_city,
            today: state.now().date_naive(),
            custom_fields: &request.custom_fields,
        };

        render(&self.template.content, &context.values())
    }
}

pub async fn generate(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<GeneratedDocument>, AppError> {
    let sources = Sources::load(&state, &request).await?;
    let content = sources.render(&state, &request);

    Ok(Json(GeneratedDocument {
        content,
        template_type: request.template_type,
        patient_name: sources.patient.name,
        doctor_name: sources.doctor.name,
        doctor_cro: sources.doctor.cro,
        generated_at: state.now().to_rfc3339(),
    }))
}

pub async fn generate_pdf(
    AxumState(state): AxumState<Arc<State>>,
    _: StaffUser,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<GeneratedPdf>, AppError> {
    let sources = Sources::load(&state, &request).await?;
    let content = sources.render(&state, &request);

    let kind = request.template_type;
    let title = format!("{kind} - {}", sources.patient.name);
    let header = state.config.clinic_name.to_uppercase();

    let bytes = spawn_blocking(move || render_pdf(&title, &header, &content))
        .await
        .map_err(AppError::internal)??;

    info!(
        "Generated {kind} PDF for patient {} ({} bytes)",
        sources.patient.id,
        bytes.len()
    );

    Ok(Json(GeneratedPdf {
        pdf_base64: STANDARD.encode(&bytes),
        filename: pdf_filename(kind, &sources.patient.name, state.now().date_naive()),
    }))
}
