use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Does not read `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset for optional secrets.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("CFACTORY_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_as(
        "CFACTORY_BIND_ADDR",
        &or_default("CFACTORY_BIND_ADDR", "0.0.0.0:8000"),
    )?;
    let log_level = or_default("CFACTORY_LOG_LEVEL", "info");

    let db_max_connections: u32 = parse_as(
        "CFACTORY_DB_MAX_CONNECTIONS",
        &or_default("CFACTORY_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "CFACTORY_DB_MIN_CONNECTIONS",
        &or_default("CFACTORY_DB_MIN_CONNECTIONS", "1"),
    )?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "CFACTORY_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }
    let db_acquire_timeout_secs: u64 = parse_as(
        "CFACTORY_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("CFACTORY_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_base_url = or_default("CFACTORY_OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_model = or_default("CFACTORY_OPENAI_MODEL", "gpt-4-turbo-preview");
    let openai_timeout_secs: u64 = parse_as(
        "CFACTORY_OPENAI_TIMEOUT_SECS",
        &or_default("CFACTORY_OPENAI_TIMEOUT_SECS", "60"),
    )?;

    let apify_api_token = optional("APIFY_API_TOKEN");
    let apify_base_url = or_default("CFACTORY_APIFY_BASE_URL", "https://api.apify.com/v2");
    let apify_timeout_secs: u64 = parse_as(
        "CFACTORY_APIFY_TIMEOUT_SECS",
        &or_default("CFACTORY_APIFY_TIMEOUT_SECS", "300"),
    )?;

    let s3_endpoint = optional("CFACTORY_S3_ENDPOINT");
    let s3_region = or_default("CFACTORY_S3_REGION", "us-east-1");
    let s3_bucket = or_default("CFACTORY_S3_BUCKET", "content-factory");
    let s3_access_key = optional("CFACTORY_S3_ACCESS_KEY");
    let s3_secret_key = optional("CFACTORY_S3_SECRET_KEY");

    let output_dir = PathBuf::from(or_default("CFACTORY_OUTPUT_DIR", "./output"));
    let font_bold_path = PathBuf::from(or_default(
        "CFACTORY_FONT_BOLD",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ));
    let font_regular_path = PathBuf::from(or_default(
        "CFACTORY_FONT_REGULAR",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ));

    let worker_concurrency: usize = parse_as(
        "CFACTORY_WORKER_CONCURRENCY",
        &or_default("CFACTORY_WORKER_CONCURRENCY", "2"),
    )?;
    if worker_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CFACTORY_WORKER_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let worker_poll_interval_ms: u64 = parse_as(
        "CFACTORY_WORKER_POLL_INTERVAL_MS",
        &or_default("CFACTORY_WORKER_POLL_INTERVAL_MS", "1000"),
    )?;
    let stale_run_after_secs: u64 = parse_as(
        "CFACTORY_STALE_RUN_AFTER_SECS",
        &or_default("CFACTORY_STALE_RUN_AFTER_SECS", "1800"),
    )?;
    let download_url_ttl_secs: u64 = parse_as(
        "CFACTORY_DOWNLOAD_URL_TTL_SECS",
        &or_default("CFACTORY_DOWNLOAD_URL_TTL_SECS", "3600"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        openai_api_key,
        openai_base_url,
        openai_model,
        openai_timeout_secs,
        apify_api_token,
        apify_base_url,
        apify_timeout_secs,
        s3_endpoint,
        s3_region,
        s3_bucket,
        s3_access_key,
        s3_secret_key,
        output_dir,
        font_bold_path,
        font_regular_path,
        worker_concurrency,
        worker_poll_interval_ms,
        stale_run_after_secs,
        download_url_ttl_secs,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CFACTORY_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
