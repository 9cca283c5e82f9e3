//! In-memory capability providers for pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cfactory_core::{ContentView, PlanStructure, SlideDescriptor};
use cfactory_db::NewContentItem;
use cfactory_pipeline::PipelineContext;
use cfactory_renderer::FontSet;
use cfactory_scraper::{ApifyError, DiscoveredProfile, HarvestedPost, SocialScraper};
use cfactory_storage::{ObjectStore, StorageError};

#[derive(Default)]
pub struct FakeScraper {
    pub profiles: Vec<DiscoveredProfile>,
    pub posts: Vec<HarvestedPost>,
    pub hashtag_posts: Vec<HarvestedPost>,
    pub failure: Option<(u16, String)>,
    pub fetched_usernames: Mutex<Vec<String>>,
    pub fetched_hashtags: Mutex<Vec<String>>,
}

impl FakeScraper {
    fn check_failure(&self) -> Result<(), ApifyError> {
        match &self.failure {
            Some((status, message)) => Err(ApifyError::Api {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SocialScraper for FakeScraper {
    async fn discover_profiles(
        &self,
        _actor_id: &str,
        _query: &str,
        _limit: u32,
    ) -> Result<Vec<DiscoveredProfile>, ApifyError> {
        self.check_failure()?;
        Ok(self.profiles.clone())
    }

    async fn fetch_posts(
        &self,
        _actor_id: &str,
        usernames: &[String],
        _posts_per_profile: u32,
    ) -> Result<Vec<HarvestedPost>, ApifyError> {
        self.check_failure()?;
        self.fetched_usernames
            .lock()
            .unwrap()
            .extend(usernames.iter().cloned());
        Ok(self.posts.clone())
    }

    async fn fetch_hashtag_posts(
        &self,
        _actor_id: &str,
        hashtags: &[String],
        _posts_per_hashtag: u32,
    ) -> Result<Vec<HarvestedPost>, ApifyError> {
        self.check_failure()?;
        self.fetched_hashtags
            .lock()
            .unwrap()
            .extend(hashtags.iter().cloned());
        Ok(self.hashtag_posts.clone())
    }
}

/// Replies with canned model text per URL; scores go through the real parser.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    pub score_replies: HashMap<String, String>,
    pub plan: Option<PlanStructure>,
}

#[async_trait]
impl cfactory_analyzer::ContentAnalyzer for ScriptedAnalyzer {
    async fn score_relevance(&self, item: ContentView<'_>) -> f64 {
        let reply = self
            .score_replies
            .get(item.url)
            .map_or("", String::as_str);
        cfactory_analyzer::parse_score(reply)
    }

    async fn generate_plan(&self, _item: ContentView<'_>) -> Option<PlanStructure> {
        self.plan.clone()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_uploads: bool,
}

impl MemoryStore {
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, local_path: &Path, object_key: &str) -> Result<(), StorageError> {
        if self.fail_uploads {
            return Err(StorageError::Upload {
                key: object_key.to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }
        let bytes = std::fs::read(local_path)?;
        self.objects
            .lock()
            .unwrap()
            .insert(object_key.to_string(), bytes);
        Ok(())
    }

    async fn presigned_url(&self, object_key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(format!("memory://{object_key}?expires={}", ttl.as_secs()))
    }
}

pub fn context(
    pool: &sqlx::PgPool,
    scraper: Arc<FakeScraper>,
    analyzer: Arc<ScriptedAnalyzer>,
    store: Arc<MemoryStore>,
    output_dir: &Path,
) -> PipelineContext {
    PipelineContext {
        pool: pool.clone(),
        scraper,
        analyzer,
        store,
        fonts: FontSet::embedded().expect("embedded font"),
        output_dir: output_dir.to_path_buf(),
    }
}

pub fn plan_with_slides(count: u32) -> PlanStructure {
    let slides = (1..=count)
        .map(|number| SlideDescriptor {
            number,
            kind: match number {
                1 => "cover".to_string(),
                n if n == count => "cta".to_string(),
                _ => "body".to_string(),
            },
            headline: format!("Шаг {number}"),
            body_text: (number > 1).then(|| "Проверьте карточку товара".to_string()),
            visual_hint: None,
        })
        .collect();

    PlanStructure {
        title: "Как продавать на WB".to_string(),
        description: Some("Пошаговый гайд".to_string()),
        slides,
        cta_final: None,
        extra: serde_json::Map::new(),
    }
}

pub fn post(url: &str, author: &str) -> HarvestedPost {
    HarvestedPost {
        url: Some(url.to_string()),
        platform: "instagram".to_string(),
        caption: Some("Как поднять продажи".to_string()),
        metadata: serde_json::json!({
            "likes": 120,
            "views": 0,
            "comments": 4,
            "author": author,
            "type": "Image",
            "raw": {},
        }),
    }
}

pub fn typed_post(url: &str, kind: &str) -> HarvestedPost {
    let mut post = post(url, "hashtag_author");
    post.metadata["type"] = serde_json::Value::String(kind.to_string());
    post
}

pub async fn insert_item(pool: &sqlx::PgPool, url: &str) -> i64 {
    let metadata = serde_json::json!({ "likes": 42, "author": "seller_x" });
    cfactory_db::insert_content_item_if_absent(
        pool,
        &NewContentItem {
            url,
            platform: "instagram",
            caption: Some("Пять ошибок продавца"),
            metadata: &metadata,
        },
    )
    .await
    .expect("insert item");

    sqlx::query_scalar::<_, i64>("SELECT id FROM content_items WHERE url = $1")
        .bind(url)
        .fetch_one(pool)
        .await
        .expect("item id")
}

pub async fn count_rows(pool: &sqlx::PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count")
}
