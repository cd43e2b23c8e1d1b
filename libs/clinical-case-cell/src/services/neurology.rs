use anyhow::Result;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{SupabaseClient, TableQuery};

use crate::models::{CaseError, FormResult, NeurologyAssessment, NeurologyUpdateRequest};
use crate::scoring::{cognitive_decline, score_total, AssessmentForm, FunctionalStage, ScoreSet};

const TABLE: &str = "neurology_assessments";

/// A case has a single assessment row, keyed by `case_id`.
const CONFLICT_KEY: &str = "case_id";

pub struct NeurologyService {
    supabase: SupabaseClient,
}

impl NeurologyService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_assessment(
        &self,
        case_id: &str,
        auth_token: &str,
    ) -> Result<Option<NeurologyAssessment>> {
        self.supabase
            .select_one(&TableQuery::table(TABLE).eq("case_id", case_id), auth_token)
            .await
    }

    /// Saves the evaluation flags, the motor and MMSE totals, notes and diagnosis.
    pub async fn save_assessment(
        &self,
        case_id: &str,
        doctor_id: &str,
        request: NeurologyUpdateRequest,
        auth_token: &str,
    ) -> Result<NeurologyAssessment, CaseError> {
        let mut body = json!({
            "case_id": case_id,
            "doctor_id": doctor_id,
            "has_chorea": request.has_chorea,
            "has_dystonia": request.has_dystonia,
            "has_bradykinesia": request.has_bradykinesia,
            "uhdrs_motor_score": request.uhdrs_motor_score.unwrap_or(0),
            "mmse_score": request.mmse_score.unwrap_or(0),
            "clinical_notes": request.clinical_notes.unwrap_or_default(),
            "diagnosis": request.diagnosis.unwrap_or_default(),
        });
        if let Some(ordered) = request.genetic_test_ordered {
            body["genetic_test_ordered"] = json!(ordered);
        }

        info!("Saving neurological evaluation of case {}", case_id);
        self.upsert(body, "neurological evaluation", auth_token).await
    }

    /// Stores one form's item scores and total on the case's assessment row.
    pub async fn save_form(
        &self,
        case_id: &str,
        doctor_id: &str,
        form: AssessmentForm,
        scores: ScoreSet,
        auth_token: &str,
    ) -> Result<FormResult, CaseError> {
        let scores = form.normalize(scores);
        let total = score_total(&scores);

        let mut body = Map::new();
        body.insert("case_id".into(), json!(case_id));
        body.insert("doctor_id".into(), json!(doctor_id));
        body.insert(form.info_column().into(), json!(scores));
        body.insert(form.score_column().into(), json!(total));

        debug!("Saving {} form of case {} (total {})", form, case_id, total);
        self.upsert(Value::Object(body), "assessment form", auth_token)
            .await?;

        Ok(FormResult {
            form,
            total,
            display_max: form.display_max(),
            stage: (form == AssessmentForm::Functional).then(|| FunctionalStage::from_tfc(total)),
            cognitive_decline: (form == AssessmentForm::Cognitive).then(|| cognitive_decline(total)),
            scores,
        })
    }

    async fn upsert(
        &self,
        body: Value,
        what: &'static str,
        auth_token: &str,
    ) -> Result<NeurologyAssessment, CaseError> {
        let rows: Vec<NeurologyAssessment> = self
            .supabase
            .upsert(TABLE, body, Some(CONFLICT_KEY), auth_token)
            .await
            .map_err(|e| CaseError::NotSaved(what, e))?;

        Ok(rows.into_iter().next().unwrap_or_default())
    }
}
