use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use patient_cell::models::{MedicalHistory, TriageRecord};
use shared_models::de::{optional_id, optional_score};
use shared_models::error::AppError;
use shared_models::profile::Profile;

use crate::scoring::{FunctionalStage, ScoreSet};

/// `clinical_cases.status` of a freshly opened case.
pub const CASE_STATUS_OPEN: i32 = 1;

/// Laboratory areas a doctor can order from. Stored verbatim in `lab_results.type`.
pub const LAB_TYPES: [&str; 6] = [
    "Bioquímica y Hematología",
    "Inmunología y Serología",
    "Microbiología y Parasitología",
    "Genética y Biología Molecular",
    "Urianálisis y Líquidos Corporales",
    "Endocrinología (Hormonas)",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalCase {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    pub patient_id: String,
    pub code_case: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub is_active: bool,
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    optional_id(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing case id"))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCaseRequest {
    pub patient_id: Option<String>,
    pub code_case: Option<String>,
}

impl CreateCaseRequest {
    /// Returns `(patient_id, code_case)` once both are present and non-blank.
    pub fn validate(self) -> Result<(String, String), CaseError> {
        let patient_id = self.patient_id.filter(|p| !p.trim().is_empty());
        let code = self
            .code_case
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        match (patient_id, code) {
            (Some(patient_id), Some(code)) => Ok((patient_id, code)),
            _ => Err(CaseError::Validation(
                "Select a patient and enter a case code".to_string(),
            )),
        }
    }
}

/// Anamnesis recorded by the doctor; a case has at most one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConsultation {
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub case_id: String,
    #[serde(default)]
    pub reason_consultation: Option<String>,
    #[serde(default)]
    pub current_illness: String,
    #[serde(default)]
    pub family_history: String,
    #[serde(default)]
    pub pathological_history: Option<String>,
    #[serde(default)]
    pub physical_exam_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabResult {
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub case_id: String,
    #[serde(rename = "type")]
    pub lab_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub results_json: Option<Value>,
    #[serde(default)]
    pub result_text: Option<String>,
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
    /// `false` while the order is pending.
    #[serde(default)]
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LabResult {
    /// Whether the lab area covers genetics or molecular biology,
    /// ignoring case and accents.
    pub fn is_genetic(&self) -> bool {
        let folded = fold_accents(&self.lab_type);
        folded.contains("genet") || folded.contains("molecular")
    }
}

fn fold_accents(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabOrderRequest {
    #[serde(rename = "type")]
    pub lab_type: String,
    #[serde(default)]
    pub description: String,
}

/// The doctor's lab order entry: the picked area and the free-text request.
#[derive(Debug, Clone, PartialEq)]
pub struct LabOrderForm {
    pub lab_type: String,
    pub description: String,
}

impl Default for LabOrderForm {
    fn default() -> Self {
        Self {
            lab_type: LAB_TYPES[0].to_string(),
            description: String::new(),
        }
    }
}

impl From<LabOrderRequest> for LabOrderForm {
    fn from(request: LabOrderRequest) -> Self {
        Self {
            lab_type: request.lab_type,
            description: request.description,
        }
    }
}

impl LabOrderForm {
    /// Area and trimmed description, or the reason the order cannot be sent.
    pub fn validate(&self) -> Result<(&str, &str), CaseError> {
        if !LAB_TYPES.contains(&self.lab_type.as_str()) {
            return Err(CaseError::Validation(format!(
                "Unknown lab type: {}",
                self.lab_type
            )));
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(CaseError::Validation(
                "Enter a description for the lab test".to_string(),
            ));
        }

        Ok((&self.lab_type, description))
    }
}

/// The single neurological evaluation row of a case.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NeurologyAssessment {
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub case_id: String,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub has_chorea: bool,
    #[serde(default)]
    pub has_dystonia: bool,
    #[serde(default)]
    pub has_bradykinesia: bool,
    #[serde(default, deserialize_with = "optional_score")]
    pub uhdrs_motor_score: Option<i32>,
    #[serde(default, deserialize_with = "optional_score")]
    pub mmse_score: Option<i32>,
    #[serde(default, deserialize_with = "optional_score")]
    pub pba_score: Option<i32>,
    #[serde(default, deserialize_with = "optional_score")]
    pub fc_score: Option<i32>,
    #[serde(default)]
    pub uhdrs_motor_info: Option<Value>,
    #[serde(default)]
    pub mmse_info: Option<Value>,
    #[serde(default)]
    pub pba_info: Option<Value>,
    #[serde(default)]
    pub fc_info: Option<Value>,
    #[serde(default)]
    pub clinical_notes: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub genetic_test_ordered: Option<bool>,
}

/// Neurological evaluation form. Score fields arrive as typed text; anything
/// that does not parse as a number is saved as 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeurologyUpdateRequest {
    #[serde(default)]
    pub has_chorea: bool,
    #[serde(default)]
    pub has_dystonia: bool,
    #[serde(default)]
    pub has_bradykinesia: bool,
    #[serde(default, deserialize_with = "optional_score")]
    pub uhdrs_motor_score: Option<i32>,
    #[serde(default, deserialize_with = "optional_score")]
    pub mmse_score: Option<i32>,
    #[serde(default)]
    pub clinical_notes: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub genetic_test_ordered: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormScoresRequest {
    #[serde(default)]
    pub scores: ScoreSet,
}

/// A saved assessment form with its derived readings.
#[derive(Debug, Clone, Serialize)]
pub struct FormResult {
    pub form: crate::scoring::AssessmentForm,
    pub scores: ScoreSet,
    pub total: i32,
    pub display_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FunctionalStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognitive_decline: Option<bool>,
}

/// Section names reported in `CaseDetail::unavailable_sections`.
pub mod section {
    pub const PATIENT: &str = "patient";
    pub const MEDICAL_HISTORY: &str = "medical_history";
    pub const TRIAGE: &str = "triage";
    pub const ANAMNESIS: &str = "anamnesis";
    pub const LABS: &str = "labs";
    pub const NEUROLOGY: &str = "neurology";
}

/// Everything the doctor's case screen shows. Sections that failed to load
/// are left empty and named in `unavailable_sections`.
#[derive(Debug, Clone, Serialize)]
pub struct CaseDetail {
    pub case: ClinicalCase,
    pub patient: Option<Profile>,
    pub medical_history: Option<MedicalHistory>,
    pub triage: Option<TriageRecord>,
    pub anamnesis: Option<GeneralConsultation>,
    pub labs: Vec<LabResult>,
    pub neurology: Option<NeurologyAssessment>,
    pub unavailable_sections: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("{0}")]
    Validation(String),

    #[error("Clinical case not found")]
    NotFound,

    #[error("Unknown assessment form: {0}")]
    UnknownForm(String),

    #[error("Could not save the {0}")]
    NotSaved(&'static str, #[source] anyhow::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<CaseError> for AppError {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::Validation(msg) => AppError::BadRequest(msg),
            CaseError::NotFound => AppError::NotFound("Clinical case not found".to_string()),
            CaseError::UnknownForm(form) => {
                AppError::NotFound(format!("Unknown assessment form: {}", form))
            }
            CaseError::NotSaved(what, e) => {
                AppError::database(&format!("Could not save the {}", what), e)
            }
            CaseError::Store(e) => AppError::database("Could not load the clinical case", e),
        }
    }
}
