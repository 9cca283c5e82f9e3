use serde::Serialize;

/// Input for a profile-search actor such as `apify/instagram-search-scraper`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSearchInput<'a> {
    pub search: &'a str,
    pub search_type: &'static str,
    pub results_limit: u32,
}

impl<'a> ProfileSearchInput<'a> {
    #[must_use]
    pub fn users(query: &'a str, limit: u32) -> Self {
        Self {
            search: query,
            search_type: "user",
            results_limit: limit,
        }
    }
}

/// Input for a post-scraper actor such as `apify/instagram-scraper`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostScrapeInput {
    pub direct_urls: Vec<String>,
    pub results_limit: u32,
    pub results_type: &'static str,
}

impl PostScrapeInput {
    /// Builds an input that scrapes the latest posts of each profile.
    #[must_use]
    pub fn for_profiles(usernames: &[String], per_profile: u32) -> Self {
        Self {
            direct_urls: usernames
                .iter()
                .map(|u| format!("https://www.instagram.com/{u}/"))
                .collect(),
            results_limit: per_profile,
            results_type: "posts",
        }
    }
}

/// Input for a hashtag actor such as `apify/instagram-hashtag-scraper`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagScrapeInput {
    pub hashtags: Vec<String>,
    pub results_limit: u32,
    pub results_type: &'static str,
}

impl HashtagScrapeInput {
    /// Builds an input for the most recent posts under each tag.
    #[must_use]
    pub fn for_hashtags(hashtags: &[String], per_hashtag: u32) -> Self {
        Self {
            hashtags: hashtags.to_vec(),
            results_limit: per_hashtag,
            results_type: "posts",
        }
    }
}

/// One profile returned by a discovery search.
///
/// `username` is absent when the actor returned a non-profile row; callers
/// count it as found but do not store it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredProfile {
    pub username: Option<String>,
    pub followers: Option<i64>,
}

/// One post returned by a harvest, with its metadata already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestedPost {
    pub url: Option<String>,
    pub platform: String,
    pub caption: Option<String>,
    pub metadata: serde_json::Value,
}

/// Post types that carry carousel-worthy material: videos (reels) and albums.
const REEL_OR_ALBUM_TYPES: [&str; 5] = ["video", "sidecar", "reel", "clips", "carousel"];

impl HarvestedPost {
    /// Whether the normalized `type` names a reel or an album; single photos
    /// and untyped rows are not.
    #[must_use]
    pub fn is_reel_or_album(&self) -> bool {
        self.metadata
            .get("type")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|kind| {
                REEL_OR_ALBUM_TYPES
                    .iter()
                    .any(|known| kind.eq_ignore_ascii_case(known))
            })
    }
}
