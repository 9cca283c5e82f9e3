//! Language-model scoring and carousel planning.
//!
//! The public [`ContentAnalyzer`] operations never fail: a transport error,
//! a bad status, or an unusable reply degrades to a score of `0` or to no
//! plan, and the cause is logged. The fallible steps are exposed on
//! [`OpenAiClient`] for callers that want the error.

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

use async_trait::async_trait;
use cfactory_core::{ContentView, PlanStructure};

pub use client::OpenAiClient;
pub use error::AnalyzerError;
pub use prompt::{parse_plan, parse_score, truncate_chars};
pub use types::{ChatMessage, ChatRequest, ResponseFormat};

const SCORE_MAX_TOKENS: u32 = 10;

/// Scoring and planning capability used by the task runner.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    /// Relevance in `[0, 100]`; `0` when the model cannot be reached or parsed.
    async fn score_relevance(&self, item: ContentView<'_>) -> f64;

    /// A carousel outline, or `None` when no usable plan came back.
    async fn generate_plan(&self, item: ContentView<'_>) -> Option<PlanStructure>;
}

impl OpenAiClient {
    /// Asks the model for a relevance score.
    ///
    /// # Errors
    ///
    /// Propagates any [`AnalyzerError`] from the completion call.
    pub async fn try_score(&self, item: &ContentView<'_>) -> Result<f64, AnalyzerError> {
        let request = ChatRequest {
            model: self.model(),
            messages: vec![ChatMessage::user(prompt::score_prompt(item))],
            max_tokens: Some(SCORE_MAX_TOKENS),
            response_format: None,
        };
        let reply = self.complete(&request).await?;
        Ok(parse_score(&reply))
    }

    /// Asks the model for a carousel plan in JSON mode.
    ///
    /// # Errors
    ///
    /// Propagates completion errors, and returns [`AnalyzerError::Deserialize`]
    /// or [`AnalyzerError::InvalidPlan`] for an unusable reply.
    pub async fn try_generate_plan(
        &self,
        item: &ContentView<'_>,
    ) -> Result<PlanStructure, AnalyzerError> {
        let request = ChatRequest {
            model: self.model(),
            messages: vec![ChatMessage::user(prompt::plan_prompt(item))],
            max_tokens: None,
            response_format: Some(ResponseFormat::json_object()),
        };
        let reply = self.complete(&request).await?;
        parse_plan(&reply)
    }
}

#[async_trait]
impl ContentAnalyzer for OpenAiClient {
    async fn score_relevance(&self, item: ContentView<'_>) -> f64 {
        match self.try_score(&item).await {
            Ok(score) => {
                tracing::debug!(url = item.url, score, "scored content item");
                score
            }
            Err(e) => {
                tracing::error!(url = item.url, error = %e, "scoring failed; recording 0");
                0.0
            }
        }
    }

    async fn generate_plan(&self, item: ContentView<'_>) -> Option<PlanStructure> {
        match self.try_generate_plan(&item).await {
            Ok(plan) => {
                tracing::info!(
                    url = item.url,
                    slides = plan.slide_count(),
                    "generated carousel plan"
                );
                Some(plan)
            }
            Err(e) => {
                tracing::error!(url = item.url, error = %e, "plan generation failed");
                None
            }
        }
    }
}
