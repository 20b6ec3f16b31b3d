use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{AppointmentStatus, MovementKind, StaffRole, TemplateKind};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatientRegister {
    pub name: String,
    pub cpf: String,
    pub birth_date: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatientLogin {
    pub cpf: String,
    pub birth_date: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub associate: Option<String>,
    pub company: Option<String>,
    pub birth_date: Option<String>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.gender.is_none()
            && self.associate.is_none()
            && self.company.is_none()
            && self.birth_date.is_none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaffCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: StaffRole,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StaffUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<StaffRole>,
    pub permissions: Option<Vec<String>>,
    pub active: Option<bool>,
}

impl StaffUpdate {
    /// Fields only an administrator may touch.
    pub fn touches_privileges(&self) -> bool {
        self.role.is_some() || self.permissions.is_some() || self.active.is_some()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaffLogin {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitCreate {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UnitUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceCreate {
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub price: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoctorCreate {
    pub name: String,
    pub specialty: String,
    pub unit_id: String,
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

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DoctorUpdate {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub unit_id: Option<String>,
    pub cro: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub photo_base64: Option<String>,
    pub bio: Option<String>,
    pub available_days: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppointmentCreate {
    pub unit_id: String,
    pub service_id: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub paid_value: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryItemCreate {
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    #[serde(default)]
    pub min_quantity: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InventoryItemUpdate {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
    pub min_quantity: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MovementCreate {
    pub item_id: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: u32,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateUpdate {
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub template_type: TemplateKind,
    pub patient_id: String,
    pub doctor_id: String,
    /// Free-form values such as `dias_afastamento` or `medicamentos`.
    #[serde(default)]
    pub custom_fields: HashMap<String, Value>,
}
