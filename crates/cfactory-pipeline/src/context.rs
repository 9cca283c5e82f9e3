//! Capabilities shared by every run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use cfactory_analyzer::{ContentAnalyzer, OpenAiClient};
use cfactory_core::{AppConfig, ContentView, PlanStructure};
use cfactory_renderer::FontSet;
use cfactory_scraper::{ApifyClient, ApifyError, DiscoveredProfile, HarvestedPost, SocialScraper};
use cfactory_storage::{ObjectStore, S3Storage, StorageError};
use sqlx::PgPool;

/// Database pool plus the external capabilities a run may call.
///
/// Tests build this directly with in-memory fakes.
#[derive(Clone)]
pub struct PipelineContext {
    pub pool: PgPool,
    pub scraper: Arc<dyn SocialScraper>,
    pub analyzer: Arc<dyn ContentAnalyzer>,
    pub store: Arc<dyn ObjectStore>,
    pub fonts: FontSet,
    pub output_dir: PathBuf,
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl PipelineContext {
    /// Wires the production adapters from configuration.
    ///
    /// A missing Apify token, `OpenAI` key, or S3 credential does not stop
    /// startup; runs that need the capability fail with an upstream error.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the embedded
    /// font cannot be parsed.
    pub fn from_app_config(pool: PgPool, config: &AppConfig) -> anyhow::Result<Self> {
        let scraper: Arc<dyn SocialScraper> = match config.apify_api_token.as_deref() {
            Some(token) => Arc::new(
                ApifyClient::with_base_url(token, config.apify_timeout_secs, &config.apify_base_url)
                    .context("failed to build Apify client")?,
            ),
            None => {
                tracing::warn!("APIFY_API_TOKEN is not set; discovery and harvest runs will fail");
                Arc::new(UnconfiguredScraper)
            }
        };

        let analyzer: Arc<dyn ContentAnalyzer> = match config.openai_api_key.as_deref() {
            Some(key) => Arc::new(
                OpenAiClient::with_base_url(
                    key,
                    &config.openai_model,
                    config.openai_timeout_secs,
                    &config.openai_base_url,
                )
                .context("failed to build OpenAI client")?,
            ),
            None => {
                tracing::warn!("OPENAI_API_KEY is not set; scores will be 0 and plans empty");
                Arc::new(UnconfiguredAnalyzer)
            }
        };

        let store: Arc<dyn ObjectStore> = match S3Storage::from_app_config(config) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(error = %e, "object storage unavailable; generation runs will fail");
                Arc::new(UnconfiguredStore(e.to_string()))
            }
        };

        let fonts = FontSet::load(&config.font_bold_path, &config.font_regular_path)
            .context("failed to load slide fonts")?;

        Ok(Self {
            pool,
            scraper,
            analyzer,
            store,
            fonts,
            output_dir: config.output_dir.clone(),
        })
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

struct UnconfiguredScraper;

#[async_trait]
impl SocialScraper for UnconfiguredScraper {
    async fn discover_profiles(
        &self,
        _actor_id: &str,
        _query: &str,
        _limit: u32,
    ) -> Result<Vec<DiscoveredProfile>, ApifyError> {
        Err(ApifyError::MissingToken)
    }

    async fn fetch_posts(
        &self,
        _actor_id: &str,
        _usernames: &[String],
        _posts_per_profile: u32,
    ) -> Result<Vec<HarvestedPost>, ApifyError> {
        Err(ApifyError::MissingToken)
    }

    async fn fetch_hashtag_posts(
        &self,
        _actor_id: &str,
        _hashtags: &[String],
        _posts_per_hashtag: u32,
    ) -> Result<Vec<HarvestedPost>, ApifyError> {
        Err(ApifyError::MissingToken)
    }
}

struct UnconfiguredAnalyzer;

#[async_trait]
impl ContentAnalyzer for UnconfiguredAnalyzer {
    async fn score_relevance(&self, item: ContentView<'_>) -> f64 {
        tracing::error!(url = item.url, "OPENAI_API_KEY is not set; recording 0");
        0.0
    }

    async fn generate_plan(&self, item: ContentView<'_>) -> Option<PlanStructure> {
        tracing::error!(url = item.url, "OPENAI_API_KEY is not set; no plan generated");
        None
    }
}

/// Carries the configuration error so every call reports the missing key.
struct UnconfiguredStore(String);

#[async_trait]
impl ObjectStore for UnconfiguredStore {
    async fn upload(&self, _local_path: &Path, object_key: &str) -> Result<(), StorageError> {
        Err(StorageError::Upload {
            key: object_key.to_string(),
            message: self.0.clone(),
        })
    }

    async fn presigned_url(
        &self,
        object_key: &str,
        _ttl: Duration,
    ) -> Result<String, StorageError> {
        Err(StorageError::Presign {
            key: object_key.to_string(),
            message: self.0.clone(),
        })
    }
}
