use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::query::sanitize_search_term;
use shared_database::{SupabaseClient, TableQuery};
use shared_models::profile::{Profile, Role};

use crate::models::{
    CaseId, MedicalHistory, MedicalHistoryRequest, PatientError, PatientIntake, TriageRecord,
    TriageRequest, MIN_SEARCH_CHARS, SEARCH_LIMIT,
};

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Patients whose first name, last name or DNI contains `text`.
    /// Short texts return nothing without touching the store.
    pub async fn search_patients(&self, text: &str, auth_token: &str) -> Result<Vec<Profile>> {
        let term = sanitize_search_term(text);
        if term.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }

        debug!("Searching patients matching '{}'", term);
        let pattern = format!("*{}*", term);

        self.supabase
            .select(
                &TableQuery::table("profiles")
                    .eq("id_role", Role::Patient.id())
                    .or(&[
                        format!("first_name.ilike.{}", pattern),
                        format!("last_name.ilike.{}", pattern),
                        format!("dni.ilike.{}", pattern),
                    ])
                    .limit(SEARCH_LIMIT),
                auth_token,
            )
            .await
    }

    pub async fn get_patient(&self, patient_id: &str, auth_token: &str) -> Result<Option<Profile>> {
        self.supabase
            .select_one(&TableQuery::table("profiles").eq("id", patient_id), auth_token)
            .await
    }

    pub async fn active_case_id(&self, patient_id: &str, auth_token: &str) -> Result<Option<String>> {
        let row: Option<CaseId> = self
            .supabase
            .select_one(
                &TableQuery::table("clinical_cases")
                    .select("id")
                    .eq("patient_id", patient_id)
                    .eq("is_active", true)
                    .limit(1),
                auth_token,
            )
            .await?;

        Ok(row.and_then(|r| r.id))
    }

    pub async fn get_medical_history(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Option<MedicalHistory>> {
        self.supabase
            .select_one(
                &TableQuery::table("medical_histories").eq("patient_id", patient_id),
                auth_token,
            )
            .await
    }

    /// Most recent triage of a case.
    pub async fn latest_triage(&self, case_id: &str, auth_token: &str) -> Result<Option<TriageRecord>> {
        self.supabase
            .select_one(
                &TableQuery::table("triage_records")
                    .eq("case_id", case_id)
                    .order("created_at", false)
                    .limit(1),
                auth_token,
            )
            .await
    }

    /// Active case, medical history and that case's latest triage.
    pub async fn get_intake(&self, patient_id: &str, auth_token: &str) -> Result<PatientIntake> {
        let (case_id, history) = futures::try_join!(
            self.active_case_id(patient_id, auth_token),
            self.get_medical_history(patient_id, auth_token),
        )?;

        let triage = match &case_id {
            Some(id) => self.latest_triage(id, auth_token).await?,
            None => None,
        };

        Ok(PatientIntake {
            patient_id: patient_id.to_string(),
            active_case_id: case_id,
            medical_history: history.unwrap_or_else(|| MedicalHistory {
                patient_id: patient_id.to_string(),
                ..MedicalHistory::default()
            }),
            triage,
        })
    }

    /// Records triage for the patient's active case. A case keeps one triage:
    /// an existing row is overwritten, otherwise a new one is inserted.
    pub async fn save_triage(
        &self,
        patient_id: &str,
        request: TriageRequest,
        auth_token: &str,
    ) -> Result<TriageRecord, PatientError> {
        let case_id = self
            .active_case_id(patient_id, auth_token)
            .await?
            .ok_or(PatientError::NoActiveCase)?;

        let record = request.into_record(&case_id);
        let existing = self.latest_triage(&case_id, auth_token).await?;

        let rows: Vec<TriageRecord> = match existing.and_then(|t| t.id) {
            Some(triage_id) => {
                info!("Updating triage {} of case {}", triage_id, case_id);
                self.supabase
                    .update(
                        &TableQuery::table("triage_records").eq("id", &triage_id),
                        json!(record),
                        auth_token,
                    )
                    .await
            }
            None => {
                info!("Recording first triage of case {}", case_id);
                self.supabase
                    .insert("triage_records", json!(record), auth_token)
                    .await
            }
        }
        .map_err(PatientError::TriageNotSaved)?;

        Ok(rows.into_iter().next().unwrap_or(record))
    }

    pub async fn save_medical_history(
        &self,
        patient_id: &str,
        request: MedicalHistoryRequest,
        auth_token: &str,
    ) -> Result<MedicalHistory, PatientError> {
        let history = request.into_history(patient_id);
        debug!("Saving medical history of {}", patient_id);

        let rows: Vec<MedicalHistory> = self
            .supabase
            .upsert(
                "medical_histories",
                json!(history),
                Some("patient_id"),
                auth_token,
            )
            .await
            .map_err(PatientError::HistoryNotSaved)?;

        Ok(rows.into_iter().next().unwrap_or(history))
    }
}
