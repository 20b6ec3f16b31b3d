use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub birth_date: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub associate: String,
    #[serde(default)]
    pub company: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Manager,
    Receptionist,
    Doctor,
}

/// Staff account as stored. Never serialized to clients, see [`StaffProfile`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: StaffRole,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn active_by_default() -> bool {
    true
}

impl Staff {
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin
    }

    pub fn profile(&self) -> StaffProfile {
        StaffProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            permissions: self.permissions.clone(),
            active: self.active,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StaffProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    pub permissions: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub price: f64,
}

/// Service as shown to patients: prices stay on the staff side.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PublicService {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
}

impl From<Service> for PublicService {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            duration_minutes: service.duration_minutes,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub unit_id: String,
    #[serde(default)]
    pub cro: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub photo_base64: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub available_days: Vec<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    #[serde(rename = "agendado")]
    Scheduled,
    #[serde(rename = "concluido")]
    Completed,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "agendado",
            AppointmentStatus::Completed => "concluido",
            AppointmentStatus::Cancelled => "cancelado",
        }
    }

    /// Closed appointments never show up as upcoming.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_cpf: String,
    pub unit_id: String,
    pub unit_name: String,
    pub service_id: String,
    pub service_name: String,
    #[serde(default)]
    pub service_price: f64,
    pub doctor_id: String,
    pub doctor_name: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub paid_value: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    /// Counting unit, e.g. "caixa" or "pacote".
    pub unit: String,
    #[serde(default)]
    pub min_quantity: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MovementKind {
    #[serde(rename = "entrada")]
    Inbound,
    #[serde(rename = "saida")]
    Outbound,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InventoryMovement {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: u32,
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Atestado,
    Afastamento,
    TermoConsentimento,
    Receita,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Atestado,
        TemplateKind::Afastamento,
        TemplateKind::TermoConsentimento,
        TemplateKind::Receita,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Atestado => "atestado",
            TemplateKind::Afastamento => "afastamento",
            TemplateKind::TermoConsentimento => "termo_consentimento",
            TemplateKind::Receita => "receita",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DocumentTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(AppointmentStatus::Cancelled).unwrap(),
            json!("cancelado")
        );
        let status: AppointmentStatus = serde_json::from_value(json!("concluido")).unwrap();
        assert_eq!(status, AppointmentStatus::Completed);
        assert!(status.is_closed());
        assert!(!AppointmentStatus::Scheduled.is_closed());
    }

    #[test]
    fn test_template_kind_parse() {
        assert_eq!(
            TemplateKind::parse("termo_consentimento"),
            Some(TemplateKind::TermoConsentimento)
        );
        assert_eq!(TemplateKind::parse("laudo"), None);
        assert_eq!(
            serde_json::to_value(TemplateKind::Receita).unwrap(),
            json!("receita")
        );
    }

    #[test]
    fn test_patient_optional_fields_default() {
        let patient: Patient = serde_json::from_value(json!({
            "id": "p1",
            "name": "Ana",
            "cpf": "123",
            "birth_date": "01/01/1990",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(patient.phone, "");
        assert_eq!(patient.company, "");
    }

    #[test]
    fn test_staff_profile_hides_password() {
        let staff = Staff {
            id: "s1".to_string(),
            name: "Admin".to_string(),
            email: "admin@odonto.com".to_string(),
            password_hash: "$2b$hash".to_string(),
            role: StaffRole::Admin,
            permissions: vec!["all".to_string()],
            active: true,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(staff.profile()).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], json!("admin"));
    }

    #[test]
    fn test_movement_kind_field_is_type() {
        let movement: InventoryMovement = serde_json::from_value(json!({
            "id": "m1",
            "item_id": "i1",
            "item_name": "Luvas",
            "type": "saida",
            "quantity": 2,
            "doctor_id": null,
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(movement.kind, MovementKind::Outbound);
        assert_eq!(movement.created_by, "");
    }
}
