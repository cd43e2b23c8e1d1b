use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::json;
use tracing::info;

use shared_config::AppConfig;

use super::{answer_text, parse_suggestion, send_json, DiagnosisProvider};
use crate::models::{CaseData, DiagnosisError, DiagnosisSuggestion, Provider};
use crate::prompt::{openai_user_prompt, OPENAI_SYSTEM_PROMPT};

const CONTENT: &str = "/choices/0/message/content";
const NARRATIVE_TEMPERATURE: f64 = 0.7;

pub struct OpenAiProvider {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    narrative_model: String,
}

impl OpenAiProvider {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http_client: Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            narrative_model: config.openai_narrative_model.clone(),
        }
    }

    fn completions(&self) -> Result<reqwest::RequestBuilder, DiagnosisError> {
        if self.api_key.is_empty() {
            return Err(DiagnosisError::NotConfigured(Provider::OpenAi));
        }

        Ok(self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json"))
    }
}

#[async_trait]
impl DiagnosisProvider for OpenAiProvider {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn suggest(&self, data: &CaseData) -> Result<DiagnosisSuggestion, DiagnosisError> {
        let request = self.completions()?.json(&json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": OPENAI_SYSTEM_PROMPT },
                { "role": "user", "content": openai_user_prompt(data) }
            ],
            "response_format": { "type": "json_object" }
        }));

        info!("Requesting structured consultation from OpenAI ({})", self.model);
        let body = send_json(Provider::OpenAi, request).await?;
        let text = answer_text(Provider::OpenAi, &body, CONTENT)?;
        parse_suggestion(Provider::OpenAi, &text)
    }

    async fn narrate(&self, prompt: &str) -> Result<String, DiagnosisError> {
        let request = self.completions()?.json(&json!({
            "model": self.narrative_model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": NARRATIVE_TEMPERATURE
        }));

        info!("Requesting narrative from OpenAI ({})", self.narrative_model);
        let body = send_json(Provider::OpenAi, request).await?;
        answer_text(Provider::OpenAi, &body, CONTENT)
    }
}
