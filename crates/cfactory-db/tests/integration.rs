//! Offline unit tests for cfactory-db pool configuration and row types.
//! These tests do not require a live database connection.

use cfactory_core::{AppConfig, Environment};
use cfactory_db::{ContentItemRow, PoolConfig, RunRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        openai_api_key: None,
        openai_base_url: "https://api.openai.com/v1".to_string(),
        openai_model: "gpt-4-turbo-preview".to_string(),
        openai_timeout_secs: 60,
        apify_api_token: None,
        apify_base_url: "https://api.apify.com/v2".to_string(),
        apify_timeout_secs: 300,
        s3_endpoint: None,
        s3_region: "us-east-1".to_string(),
        s3_bucket: "content-factory".to_string(),
        s3_access_key: None,
        s3_secret_key: None,
        output_dir: PathBuf::from("./output"),
        font_bold_path: PathBuf::from("bold.ttf"),
        font_regular_path: PathBuf::from("regular.ttf"),
        worker_concurrency: 2,
        worker_poll_interval_ms: 1000,
        stale_run_after_secs: 1800,
        download_url_ttl_secs: 3600,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test for [`RunRow`]'s field set.
#[test]
fn run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = RunRow {
        id: 1,
        public_id: Uuid::new_v4(),
        kind: "scoring".to_string(),
        status: "pending".to_string(),
        config: serde_json::json!({ "batch_size": 10 }),
        stats: None,
        error_message: None,
        trigger_source: "api".to_string(),
        created_at: Utc::now(),
        started_at: None,
        finished_at: None,
    };

    assert_eq!(row.kind, "scoring");
    assert_eq!(row.config["batch_size"], 10);
    assert!(row.stats.is_none());
    assert!(row.finished_at.is_none());
}

#[test]
fn content_item_row_exposes_a_view() {
    use chrono::Utc;

    let row = ContentItemRow {
        id: 3,
        url: "https://www.instagram.com/p/xyz/".to_string(),
        platform: "instagram".to_string(),
        caption: Some("How to start on WB".to_string()),
        metadata: serde_json::json!({ "likes": 10, "views": 200, "author": "seller" }),
        status: "pending".to_string(),
        score: None,
        claimed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let view = row.view();
    assert_eq!(view.url, row.url);
    assert_eq!(view.caption, Some("How to start on WB"));
    assert_eq!(view.metric("views"), 200);
    assert_eq!(view.author(), "seller");
}
