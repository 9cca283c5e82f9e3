//! Minimal client for an OpenAI-compatible `chat/completions` endpoint.

use std::time::Duration;

use reqwest::Client;

use crate::error::AnalyzerError;
use crate::types::{ChatRequest, ChatResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Creates a client against the public OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, AnalyzerError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (proxies, tests).
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one chat completion and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// - [`AnalyzerError::Http`] on transport failure or timeout.
    /// - [`AnalyzerError::Api`] on a non-2xx status.
    /// - [`AnalyzerError::Deserialize`] if the body is not a completion.
    /// - [`AnalyzerError::EmptyResponse`] if there is no choice or its content is blank.
    pub async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, AnalyzerError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<ChatResponse>(&body).map_err(|e| {
            AnalyzerError::Deserialize {
                context: "chat completion".to_string(),
                source: e,
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AnalyzerError::EmptyResponse)
    }
}
