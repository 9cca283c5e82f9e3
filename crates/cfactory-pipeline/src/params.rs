//! Typed run parameters.
//!
//! A run's `config` document is read loosely: missing keys take defaults and
//! unknown keys are ignored, but a known key with the wrong type rejects the
//! run. `null` is treated as an empty object.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::PipelineError;

pub const DEFAULT_DISCOVERY_ACTOR: &str = "apify/instagram-search-scraper";
pub const DEFAULT_HARVEST_ACTOR: &str = "apify/instagram-scraper";
pub const DEFAULT_HASHTAG_ACTOR: &str = "apify/instagram-hashtag-scraper";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscoveryParams {
    pub queries: Vec<String>,
    pub limit_per_query: u32,
    pub actor_id: String,
    pub platform: String,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            queries: vec!["wildberries".to_string(), "бизнес на вб".to_string()],
            limit_per_query: 10,
            actor_id: DEFAULT_DISCOVERY_ACTOR.to_string(),
            platform: "instagram".to_string(),
        }
    }
}

/// A non-empty `hashtags` list switches the harvest from tracked accounts to
/// hashtag search; the account fields are then ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarvestParams {
    pub accounts_limit: u32,
    pub posts_per_profile: u32,
    pub actor_id: String,
    pub hashtags: Vec<String>,
    pub posts_per_hashtag: u32,
    pub hashtag_actor_id: String,
}

impl Default for HarvestParams {
    fn default() -> Self {
        Self {
            accounts_limit: 5,
            posts_per_profile: 10,
            actor_id: DEFAULT_HARVEST_ACTOR.to_string(),
            hashtags: Vec::new(),
            posts_per_hashtag: 20,
            hashtag_actor_id: DEFAULT_HASHTAG_ACTOR.to_string(),
        }
    }
}

impl HarvestParams {
    /// Hashtags trimmed and stripped of a leading `#`; blanks are dropped.
    #[must_use]
    pub fn normalized_hashtags(&self) -> Vec<String> {
        self.hashtags
            .iter()
            .map(|tag| tag.trim().trim_start_matches('#').trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub batch_size: u32,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self { batch_size: 50 }
    }
}

/// `content_id` is required; everything else defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationParams {
    pub content_id: i64,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "dark".to_string()
}

/// Deserializes a run config into `T`.
///
/// # Errors
///
/// Returns [`PipelineError::Validation`] naming the offending key when the
/// document does not fit `T`.
pub fn parse_params<T: DeserializeOwned>(config: &serde_json::Value) -> Result<T, PipelineError> {
    let result = if config.is_null() {
        serde_json::from_value(serde_json::Value::Object(serde_json::Map::new()))
    } else {
        T::deserialize(config)
    };
    result.map_err(|e| PipelineError::Validation(format!("invalid run config: {e}")))
}
