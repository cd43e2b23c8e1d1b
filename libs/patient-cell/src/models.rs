use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::de::optional_id;
use shared_models::error::AppError;
use shared_models::profile::Profile;

/// Search texts shorter than this return nothing without querying.
pub const MIN_SEARCH_CHARS: usize = 3;
pub const SEARCH_LIMIT: usize = 5;

/// Triage priority used when the nurse leaves it unset ("medium").
pub const DEFAULT_TRIAGE_PRIORITY: i32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MedicalHistory {
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub blood_type: String,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
}

/// Vital signs taken by a nurse for a clinical case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriageRecord {
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub case_id: String,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub height_cm: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub systolic_pressure: i32,
    #[serde(default)]
    pub diastolic_pressure: i32,
    #[serde(default)]
    pub heart_rate: i32,
    #[serde(default)]
    pub oxygen_saturation: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_priority() -> i32 {
    DEFAULT_TRIAGE_PRIORITY
}

/// Triage form. Blank measurements are stored as zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriageRequest {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub temperature: Option<f64>,
    pub systolic_pressure: Option<i32>,
    pub diastolic_pressure: Option<i32>,
    pub heart_rate: Option<i32>,
    pub oxygen_saturation: Option<i32>,
    pub notes: Option<String>,
    pub priority: Option<i32>,
}

impl TriageRequest {
    pub fn into_record(self, case_id: &str) -> TriageRecord {
        TriageRecord {
            id: None,
            case_id: case_id.to_string(),
            weight_kg: self.weight_kg.unwrap_or_default(),
            height_cm: self.height_cm.unwrap_or_default(),
            temperature: self.temperature.unwrap_or_default(),
            systolic_pressure: self.systolic_pressure.unwrap_or_default(),
            diastolic_pressure: self.diastolic_pressure.unwrap_or_default(),
            heart_rate: self.heart_rate.unwrap_or_default(),
            oxygen_saturation: self.oxygen_saturation.unwrap_or_default(),
            notes: self.notes,
            priority: self.priority.unwrap_or(DEFAULT_TRIAGE_PRIORITY),
            created_at: None,
        }
    }
}

/// Medical history form; list fields arrive comma separated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicalHistoryRequest {
    #[serde(default)]
    pub blood_type: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub chronic_conditions: String,
}

impl MedicalHistoryRequest {
    pub fn into_history(self, patient_id: &str) -> MedicalHistory {
        MedicalHistory {
            id: None,
            patient_id: patient_id.to_string(),
            allergies: split_list(&self.allergies),
            blood_type: self.blood_type.trim().to_string(),
            chronic_conditions: split_list(&self.chronic_conditions),
        }
    }
}

/// "penicilina, polen ,," -> ["penicilina", "polen"]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `id` projection of a clinical case.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseId {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,
}

/// What the nurse sees after picking a patient.
#[derive(Debug, Clone, Serialize)]
pub struct PatientIntake {
    pub patient_id: String,
    pub active_case_id: Option<String>,
    pub medical_history: MedicalHistory,
    pub triage: Option<TriageRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientSearchResult {
    pub patients: Vec<Profile>,
    pub total: usize,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("The patient has no active clinical case")]
    NoActiveCase,

    #[error("Could not save the triage")]
    TriageNotSaved(#[source] anyhow::Error),

    #[error("Could not save the medical history")]
    HistoryNotSaved(#[source] anyhow::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NoActiveCase => {
                AppError::BadRequest("The patient has no active clinical case".to_string())
            }
            PatientError::TriageNotSaved(e) => AppError::database("Could not save the triage", e),
            PatientError::HistoryNotSaved(e) => {
                AppError::database("Could not save the medical history", e)
            }
            PatientError::Store(e) => AppError::database("Could not load patient data", e),
        }
    }
}
