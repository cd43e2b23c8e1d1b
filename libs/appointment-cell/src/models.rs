// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use shared_models::profile::ProfileRef;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// `appointment_status` ids.
pub mod status {
    pub const PENDING: i32 = 1;
}

/// `type_appointment` ids.
pub mod kind {
    pub const FIRST_VISIT: i32 = 1;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: i32,
    #[serde(rename = "type")]
    pub appointment_type: i32,
    #[serde(default)]
    pub case_id: Option<String>,
}

/// Receptionist booking form. Every field is required; they are optional here
/// so a missing one becomes a validation message rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    /// The slot's `starts_at` as offered by the slot listing.
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Validated booking, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub doctor_id: String,
    pub patient_id: String,
    pub scheduled_at: DateTime<Utc>,
}

impl BookAppointmentRequest {
    pub fn validate(self) -> Result<NewAppointment, AppointmentError> {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        match (
            non_blank(self.doctor_id),
            non_blank(self.patient_id),
            self.scheduled_at,
        ) {
            (Some(doctor_id), Some(patient_id), Some(scheduled_at)) => Ok(NewAppointment {
                doctor_id,
                patient_id,
                scheduled_at,
            }),
            _ => Err(AppointmentError::Validation(
                "Missing data: select a doctor, a patient and a time slot".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// AGENDA AND SUMMARY
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentTypeRef {
    #[serde(rename = "type")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentStatusRef {
    pub appointment_status: String,
}

/// A doctor's agenda row with its joins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgendaEntry {
    pub id: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub case_id: Option<String>,
    #[serde(rename = "type", default)]
    pub appointment_type: Option<AppointmentTypeRef>,
    #[serde(default)]
    pub status: Option<AppointmentStatusRef>,
    #[serde(default)]
    pub patient: Option<ProfileRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingAppointment {
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub doctor: Option<ProfileRef>,
    #[serde(rename = "type", default)]
    pub appointment_type: Option<AppointmentTypeRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseStatusRef {
    pub case_status: String,
}

/// `status(case_status)` projection of a clinical case.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseStatusRow {
    #[serde(default)]
    pub status: Option<CaseStatusRef>,
}

pub const NO_ACTIVE_CASE: &str = "No active case";
pub const NO_CASE_STATUS: &str = "No status";
pub const CASE_STATUS_UNAVAILABLE: &str = "Could not load";

#[derive(Debug, Clone, Serialize)]
pub struct PatientSummary {
    pub case_status: String,
    pub next_appointment: Option<UpcomingAppointment>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("{0}")]
    Validation(String),

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Could not book the appointment")]
    Booking(#[source] anyhow::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::Validation(msg) => AppError::BadRequest(msg),
            AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            AppointmentError::Booking(e) => AppError::database("Could not book the appointment", e),
            AppointmentError::Store(e) => AppError::database("Could not load appointments", e),
        }
    }
}
