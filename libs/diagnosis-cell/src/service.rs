use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use clinical_case_cell::models::{CaseError, CaseDetail};
use clinical_case_cell::CaseService;
use shared_config::AppConfig;

use crate::models::{CaseData, DiagnosisError, DiagnosisSuggestion, DualOpinion, NarrativeInput};
use crate::prompt::narrative_prompt;
use crate::providers::{DiagnosisProvider, GeminiProvider, OpenAiProvider};

/// How a consultation outcome is shown next to the other provider's.
pub fn render_consultation(outcome: Result<DiagnosisSuggestion, DiagnosisError>) -> String {
    match outcome {
        Ok(suggestion) => suggestion.render(),
        Err(err) => {
            warn!("{} consultation failed: {}", err.provider(), err);
            format!("Error consulting {}: {}", err.provider(), err)
        }
    }
}

/// Narrative failures already read as user-facing text.
pub fn render_narrative(outcome: Result<String, DiagnosisError>) -> String {
    outcome.unwrap_or_else(|err| {
        warn!("{} narrative failed: {}", err.provider(), err);
        err.to_string()
    })
}

/// Asks both providers about the same case and keeps both answers.
pub struct DiagnosisService {
    openai: Arc<dyn DiagnosisProvider>,
    gemini: Arc<dyn DiagnosisProvider>,
}

impl DiagnosisService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_providers(
            Arc::new(OpenAiProvider::new(config)),
            Arc::new(GeminiProvider::new(config)),
        )
    }

    pub fn with_providers(
        openai: Arc<dyn DiagnosisProvider>,
        gemini: Arc<dyn DiagnosisProvider>,
    ) -> Self {
        Self { openai, gemini }
    }

    /// Structured consultation with both providers at once. One failing
    /// never hides the other's answer.
    pub async fn dual_consult(&self, data: &CaseData) -> DualOpinion {
        let (openai, gemini) = futures::join!(self.openai.suggest(data), self.gemini.suggest(data));

        DualOpinion {
            openai: render_consultation(openai),
            gemini: render_consultation(gemini),
        }
    }

    pub async fn dual_narrative(&self, prompt: &str) -> DualOpinion {
        let (openai, gemini) = futures::join!(self.openai.narrate(prompt), self.gemini.narrate(prompt));

        DualOpinion {
            openai: render_narrative(openai),
            gemini: render_narrative(gemini),
        }
    }
}

/// Narrative inputs taken from a loaded case, with the age as of `today`.
pub fn narrative_input(detail: &CaseDetail, today: NaiveDate) -> NarrativeInput {
    NarrativeInput {
        patient_name: detail
            .patient
            .as_ref()
            .map(|p| p.full_name())
            .unwrap_or_default(),
        age: detail.patient.as_ref().and_then(|p| p.age_on(today)),
        labs: detail.labs.clone(),
        neuro: detail.neurology.clone().unwrap_or_default(),
    }
}

/// Loads a case and runs the dual modes over it.
pub struct CaseDiagnosisService {
    cases: CaseService,
    diagnosis: DiagnosisService,
    config: AppConfig,
}

impl CaseDiagnosisService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_diagnosis(config, DiagnosisService::new(config))
    }

    pub fn with_diagnosis(config: &AppConfig, diagnosis: DiagnosisService) -> Self {
        Self {
            cases: CaseService::new(config),
            diagnosis,
            config: config.clone(),
        }
    }

    pub async fn consult_case(&self, case_id: &str, auth_token: &str) -> Result<DualOpinion, CaseError> {
        let detail = self.cases.get_case_detail(case_id, auth_token).await?;

        info!("Dual consultation for case {}", case_id);
        Ok(self.diagnosis.dual_consult(&CaseData::from(&detail)).await)
    }

    pub async fn narrate_case(&self, case_id: &str, auth_token: &str) -> Result<DualOpinion, CaseError> {
        let detail = self.cases.get_case_detail(case_id, auth_token).await?;
        let today = Utc::now().with_timezone(&self.config.clinic_offset()).date_naive();
        let prompt = narrative_prompt(&narrative_input(&detail, today));

        info!("Dual narrative for case {}", case_id);
        Ok(self.diagnosis.dual_narrative(&prompt).await)
    }
}
