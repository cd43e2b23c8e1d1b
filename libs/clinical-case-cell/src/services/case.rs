use anyhow::Result;
use serde_json::json;
use tracing::{debug, info, warn};

use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::{SupabaseClient, TableQuery};

use crate::models::{
    section, CaseDetail, CaseError, ClinicalCase, CreateCaseRequest, GeneralConsultation,
    CASE_STATUS_OPEN,
};
use crate::services::{LabService, NeurologyService};

pub struct CaseService {
    supabase: SupabaseClient,
    patients: PatientService,
    labs: LabService,
    neurology: NeurologyService,
}

impl CaseService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            patients: PatientService::new(config),
            labs: LabService::new(config),
            neurology: NeurologyService::new(config),
        }
    }

    /// Opens a new active case for a patient.
    pub async fn create_case(
        &self,
        request: CreateCaseRequest,
        auth_token: &str,
    ) -> Result<ClinicalCase, CaseError> {
        let (patient_id, code) = request.validate()?;

        info!("Opening case {} for patient {}", code, patient_id);
        let rows: Vec<ClinicalCase> = self
            .supabase
            .insert(
                "clinical_cases",
                json!({
                    "patient_id": patient_id,
                    "code_case": code,
                    "status": CASE_STATUS_OPEN,
                    "is_active": true,
                }),
                auth_token,
            )
            .await
            .map_err(|e| CaseError::NotSaved("clinical case", e))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| CaseError::Store(anyhow::anyhow!("Case insert returned no row")))
    }

    pub async fn get_case(&self, case_id: &str, auth_token: &str) -> Result<ClinicalCase, CaseError> {
        self.supabase
            .select_one(&TableQuery::table("clinical_cases").eq("id", case_id), auth_token)
            .await?
            .ok_or(CaseError::NotFound)
    }

    pub async fn get_anamnesis(
        &self,
        case_id: &str,
        auth_token: &str,
    ) -> Result<Option<GeneralConsultation>> {
        self.supabase
            .select_one(
                &TableQuery::table("general_consultations").eq("case_id", case_id),
                auth_token,
            )
            .await
    }

    /// Loads the case, then every section of it concurrently. A section
    /// that fails is left empty and reported instead of failing the whole view.
    pub async fn get_case_detail(&self, case_id: &str, auth_token: &str) -> Result<CaseDetail, CaseError> {
        let case = self.get_case(case_id, auth_token).await?;
        debug!("Loading sections of case {}", case.id);

        let (patient, history, triage, anamnesis, labs, neurology) = futures::join!(
            self.patients.get_patient(&case.patient_id, auth_token),
            self.patients.get_medical_history(&case.patient_id, auth_token),
            self.patients.latest_triage(&case.id, auth_token),
            self.get_anamnesis(&case.id, auth_token),
            self.labs.list_labs(&case.id, auth_token),
            self.neurology.get_assessment(&case.id, auth_token),
        );

        let mut unavailable = Vec::new();
        let mut mark_unavailable = |name: &'static str, err: anyhow::Error| {
            warn!("Case {}: {} unavailable: {}", case_id, name, err);
            unavailable.push(name);
        };

        let patient = patient.unwrap_or_else(|e| {
            mark_unavailable(section::PATIENT, e);
            None
        });
        let medical_history = history.unwrap_or_else(|e| {
            mark_unavailable(section::MEDICAL_HISTORY, e);
            None
        });
        let triage = triage.unwrap_or_else(|e| {
            mark_unavailable(section::TRIAGE, e);
            None
        });
        let anamnesis = anamnesis.unwrap_or_else(|e| {
            mark_unavailable(section::ANAMNESIS, e);
            None
        });
        let labs = labs.unwrap_or_else(|e| {
            mark_unavailable(section::LABS, e);
            Vec::new()
        });
        let neurology = neurology.unwrap_or_else(|e| {
            mark_unavailable(section::NEUROLOGY, e);
            None
        });

        Ok(CaseDetail {
            case,
            patient,
            medical_history,
            triage,
            anamnesis,
            labs,
            neurology,
            unavailable_sections: unavailable,
        })
    }

    /// Writes the case's anamnesis, replacing any earlier one.
    pub async fn save_anamnesis(
        &self,
        case_id: &str,
        anamnesis: GeneralConsultation,
        auth_token: &str,
    ) -> Result<GeneralConsultation, CaseError> {
        let anamnesis = GeneralConsultation {
            case_id: case_id.to_string(),
            ..anamnesis
        };

        info!("Saving anamnesis of case {}", case_id);
        let rows: Vec<GeneralConsultation> = self
            .supabase
            .upsert(
                "general_consultations",
                json!(anamnesis),
                Some("case_id"),
                auth_token,
            )
            .await
            .map_err(|e| CaseError::NotSaved("anamnesis", e))?;

        Ok(rows.into_iter().next().unwrap_or(anamnesis))
    }
}
