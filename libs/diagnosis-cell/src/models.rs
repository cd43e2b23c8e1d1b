use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use clinical_case_cell::models::{CaseDetail, LabResult, NeurologyAssessment};
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Environment variable holding the provider's key.
    pub fn key_variable(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The case sections a doctor sends for a structured consultation.
/// Each one is passed to the model as JSON, whatever its shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseData {
    #[serde(default)]
    pub history: Value,
    #[serde(default)]
    pub triage: Value,
    #[serde(default)]
    pub labs: Value,
    #[serde(default)]
    pub neuro: Value,
}

impl From<&CaseDetail> for CaseData {
    fn from(detail: &CaseDetail) -> Self {
        Self {
            history: json!(detail.anamnesis),
            triage: json!(detail.triage),
            labs: json!(detail.labs),
            neuro: json!(detail.neurology),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisRequest {
    #[serde(default)]
    pub data: CaseData,
}

/// Structured answer both models are asked to produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisSuggestion {
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl DiagnosisSuggestion {
    /// One-line form offered to the doctor: `[High] Diagnosis. Reasoning`.
    pub fn render(&self) -> String {
        format!("[{}] {}. {}", self.confidence, self.diagnosis, self.reasoning)
    }
}

/// What each provider said about the same case.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DualOpinion {
    pub openai: String,
    pub gemini: String,
}

/// Inputs of the free-text narrative prompt.
#[derive(Debug, Clone, Default)]
pub struct NarrativeInput {
    pub patient_name: String,
    pub age: Option<u32>,
    pub labs: Vec<LabResult>,
    pub neuro: NeurologyAssessment,
}

#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error("{} not configured", .0.key_variable())]
    NotConfigured(Provider),

    #[error("Error {provider} ({status}): {message}")]
    Upstream {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("Error: empty response from {0}.")]
    EmptyResponse(Provider),

    #[error("Malformed answer from {0}: {1}")]
    Malformed(Provider, #[source] serde_json::Error),

    #[error("Could not reach {0}: {1}")]
    Transport(Provider, #[source] reqwest::Error),
}

impl DiagnosisError {
    pub fn provider(&self) -> Provider {
        match self {
            DiagnosisError::NotConfigured(p)
            | DiagnosisError::EmptyResponse(p)
            | DiagnosisError::Malformed(p, _)
            | DiagnosisError::Transport(p, _) => *p,
            DiagnosisError::Upstream { provider, .. } => *provider,
        }
    }
}

impl From<DiagnosisError> for AppError {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::NotConfigured(_) => AppError::Internal(err.to_string()),
            other => {
                tracing::error!("{} request failed: {}", other.provider(), other);
                AppError::Internal(format!(
                    "Error processing the request with {}",
                    other.provider()
                ))
            }
        }
    }
}
