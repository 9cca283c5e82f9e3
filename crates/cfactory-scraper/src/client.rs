//! HTTP client for the Apify actor API.
//!
//! Uses the synchronous `run-sync-get-dataset-items` endpoint: one POST starts
//! the actor, waits for it to finish, and returns its dataset as a JSON array.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApifyError;
use crate::normalize::{normalize_post, normalize_profile};
use crate::types::{
    DiscoveredProfile, HarvestedPost, HashtagScrapeInput, PostScrapeInput, ProfileSearchInput,
};
use crate::SocialScraper;

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

const USER_AGENT: &str = "cfactory/0.1 (+apify-client)";

pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    /// Creates a client against the public Apify API.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, ApifyError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ApifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Runs an actor to completion and returns its dataset rows.
    ///
    /// # Errors
    ///
    /// - [`ApifyError::Http`] on transport failure or timeout.
    /// - [`ApifyError::Api`] on any non-2xx status, carrying the body.
    /// - [`ApifyError::Deserialize`] if the body is not a JSON array.
    pub async fn run_actor_sync<I: Serialize + Sync>(
        &self,
        actor_id: &str,
        input: &I,
    ) -> Result<Vec<Value>, ApifyError> {
        let url = self.run_sync_url(actor_id);
        tracing::info!(actor_id, "running apify actor");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let rows = serde_json::from_str::<Vec<Value>>(&body).map_err(|e| {
            ApifyError::Deserialize {
                context: format!("dataset items from actor {actor_id}"),
                source: e,
            }
        })?;

        tracing::info!(actor_id, items = rows.len(), "apify actor finished");
        Ok(rows)
    }

    /// Actor ids use `/` between owner and name; the URL form uses `~`.
    fn run_sync_url(&self, actor_id: &str) -> String {
        format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.base_url,
            actor_id.replace('/', "~")
        )
    }
}

#[async_trait]
impl SocialScraper for ApifyClient {
    async fn discover_profiles(
        &self,
        actor_id: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<DiscoveredProfile>, ApifyError> {
        let input = ProfileSearchInput::users(query, limit);
        let rows = self.run_actor_sync(actor_id, &input).await?;
        Ok(rows.iter().map(normalize_profile).collect())
    }

    async fn fetch_posts(
        &self,
        actor_id: &str,
        usernames: &[String],
        posts_per_profile: u32,
    ) -> Result<Vec<HarvestedPost>, ApifyError> {
        let input = PostScrapeInput::for_profiles(usernames, posts_per_profile);
        let rows = self.run_actor_sync(actor_id, &input).await?;
        Ok(rows.into_iter().map(normalize_post).collect())
    }

    async fn fetch_hashtag_posts(
        &self,
        actor_id: &str,
        hashtags: &[String],
        posts_per_hashtag: u32,
    ) -> Result<Vec<HarvestedPost>, ApifyError> {
        let input = HashtagScrapeInput::for_hashtags(hashtags, posts_per_hashtag);
        let rows = self.run_actor_sync(actor_id, &input).await?;
        Ok(rows.into_iter().map(normalize_post).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_sync_url_encodes_actor_owner_separator() {
        let client = ApifyClient::with_base_url("t", 5, "https://api.example.com/v2/")
            .expect("client");
        assert_eq!(
            client.run_sync_url("apify/instagram-scraper"),
            "https://api.example.com/v2/acts/apify~instagram-scraper/run-sync-get-dataset-items"
        );
    }

    #[test]
    fn post_scrape_input_uses_profile_urls() {
        let input = PostScrapeInput::for_profiles(&["a".to_string(), "b".to_string()], 10);
        let value = serde_json::to_value(&input).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "directUrls": ["https://www.instagram.com/a/", "https://www.instagram.com/b/"],
                "resultsLimit": 10,
                "resultsType": "posts",
            })
        );
    }

    #[test]
    fn hashtag_input_lists_tags() {
        let input = HashtagScrapeInput::for_hashtags(&["wildberries".to_string()], 20);
        assert_eq!(
            serde_json::to_value(&input).expect("serialize"),
            serde_json::json!({
                "hashtags": ["wildberries"],
                "resultsLimit": 20,
                "resultsType": "posts",
            })
        );
    }

    #[test]
    fn profile_search_input_targets_users() {
        let value = serde_json::to_value(ProfileSearchInput::users("wildberries", 10))
            .expect("serialize");
        assert_eq!(value["search"], "wildberries");
        assert_eq!(value["searchType"], "user");
        assert_eq!(value["resultsLimit"], 10);
    }
}
