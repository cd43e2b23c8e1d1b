use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{SupabaseClient, TableQuery};

use crate::models::{CaseError, LabOrderForm, LabResult};

pub struct LabService {
    supabase: SupabaseClient,
}

impl LabService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Lab orders and results of a case, newest first.
    pub async fn list_labs(&self, case_id: &str, auth_token: &str) -> Result<Vec<LabResult>> {
        debug!("Loading labs of case {}", case_id);
        self.supabase
            .select(
                &TableQuery::table("lab_results")
                    .eq("case_id", case_id)
                    .order("created_at", false),
                auth_token,
            )
            .await
    }

    /// Inserts one pending lab order.
    pub async fn order_lab(
        &self,
        case_id: &str,
        lab_type: &str,
        description: &str,
        auth_token: &str,
    ) -> Result<(), CaseError> {
        info!("Ordering {} lab for case {}", lab_type, case_id);
        let _: Vec<LabResult> = self
            .supabase
            .insert(
                "lab_results",
                json!({
                    "case_id": case_id,
                    "type": lab_type,
                    "description": description,
                    "status": false,
                }),
                auth_token,
            )
            .await
            .map_err(|e| CaseError::NotSaved("lab order", e))?;

        Ok(())
    }
}

impl LabOrderForm {
    /// Sends the order and returns the refreshed list. Invalid forms never
    /// reach the store; a successful order clears the description so the
    /// next one starts blank.
    pub async fn submit(
        &mut self,
        labs: &LabService,
        case_id: &str,
        auth_token: &str,
    ) -> Result<Vec<LabResult>, CaseError> {
        let (lab_type, description) = self.validate()?;
        labs.order_lab(case_id, lab_type, description, auth_token)
            .await?;

        self.description.clear();
        Ok(labs.list_labs(case_id, auth_token).await?)
    }
}
