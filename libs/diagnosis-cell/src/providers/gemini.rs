use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::json;
use tracing::info;

use shared_config::AppConfig;

use super::{answer_text, parse_suggestion, send_json, DiagnosisProvider};
use crate::models::{CaseData, DiagnosisError, DiagnosisSuggestion, Provider};
use crate::prompt::{gemini_prompt, strip_code_fences};

const TEXT: &str = "/candidates/0/content/parts/0/text";
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiProvider {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http_client: Client::new(),
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, DiagnosisError> {
        if self.api_key.is_empty() {
            return Err(DiagnosisError::NotConfigured(Provider::Gemini));
        }

        let request = self
            .http_client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }));

        info!("Requesting content from Gemini ({})", self.model);
        let body = send_json(Provider::Gemini, request).await?;
        answer_text(Provider::Gemini, &body, TEXT)
    }
}

#[async_trait]
impl DiagnosisProvider for GeminiProvider {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn suggest(&self, data: &CaseData) -> Result<DiagnosisSuggestion, DiagnosisError> {
        let text = self.generate(&gemini_prompt(data)).await?;
        parse_suggestion(Provider::Gemini, &strip_code_fences(&text))
    }

    async fn narrate(&self, prompt: &str) -> Result<String, DiagnosisError> {
        self.generate(prompt).await
    }
}
