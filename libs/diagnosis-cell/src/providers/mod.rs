use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, error};

use crate::models::{CaseData, DiagnosisError, DiagnosisSuggestion, Provider};

pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// A large language model that can comment on a clinical case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiagnosisProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Structured consultation over the raw case sections.
    async fn suggest(&self, data: &CaseData) -> Result<DiagnosisSuggestion, DiagnosisError>;

    /// Free-text answer to a prepared prompt.
    async fn narrate(&self, prompt: &str) -> Result<String, DiagnosisError>;
}

/// Sends a request and returns the decoded body of a 2xx answer. Any other
/// status becomes [`DiagnosisError::Upstream`] carrying the provider's own
/// `error.message`.
pub(crate) async fn send_json(
    provider: Provider,
    request: RequestBuilder,
) -> Result<Value, DiagnosisError> {
    let response: Response = request
        .send()
        .await
        .map_err(|e| DiagnosisError::Transport(provider, e))?;

    let status = response.status();
    debug!("{} answered {}", provider, status);

    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        error!("{} error response: {}", provider, body);
        let message = body["error"]["message"]
            .as_str()
            .unwrap_or("Unknown")
            .to_string();
        return Err(DiagnosisError::Upstream {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}

/// Non-empty text at `pointer`, or [`DiagnosisError::EmptyResponse`].
pub(crate) fn answer_text(
    provider: Provider,
    body: &Value,
    pointer: &str,
) -> Result<String, DiagnosisError> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or(DiagnosisError::EmptyResponse(provider))
}

pub(crate) fn parse_suggestion(
    provider: Provider,
    text: &str,
) -> Result<DiagnosisSuggestion, DiagnosisError> {
    serde_json::from_str(text).map_err(|e| DiagnosisError::Malformed(provider, e))
}
