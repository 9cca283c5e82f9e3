pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

use async_trait::async_trait;

pub use client::ApifyClient;
pub use error::ApifyError;
pub use normalize::{normalize_post, normalize_profile};
pub use types::{
    DiscoveredProfile, HarvestedPost, HashtagScrapeInput, PostScrapeInput, ProfileSearchInput,
};

/// Discovery and harvest capability used by the task runner.
///
/// Implemented by [`ApifyClient`]; tests substitute an in-memory fake.
#[async_trait]
pub trait SocialScraper: Send + Sync {
    /// Searches for profiles matching `query`, returning at most `limit` rows.
    async fn discover_profiles(
        &self,
        actor_id: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<DiscoveredProfile>, ApifyError>;

    /// Fetches recent posts for every username in one batch.
    async fn fetch_posts(
        &self,
        actor_id: &str,
        usernames: &[String],
        posts_per_profile: u32,
    ) -> Result<Vec<HarvestedPost>, ApifyError>;

    /// Fetches recent posts published under each hashtag (without `#`).
    async fn fetch_hashtag_posts(
        &self,
        actor_id: &str,
        hashtags: &[String],
        posts_per_hashtag: u32,
    ) -> Result<Vec<HarvestedPost>, ApifyError>;
}
