//! S3-compatible [`ObjectStore`] (AWS S3, `MinIO`).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use cfactory_core::AppConfig;

use crate::error::StorageError;
use crate::ObjectStore;

/// Connection settings for an S3-compatible endpoint.
#[derive(Clone)]
pub struct S3Settings {
    /// Custom endpoint (e.g. `http://minio:9000`); `None` uses AWS.
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &"[redacted]")
            .field("secret_key", &"[redacted]")
            .finish()
    }
}

impl S3Settings {
    /// Reads settings from the application config.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingCredentials`] if the access or secret
    /// key is not configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, StorageError> {
        let access_key = config
            .s3_access_key
            .clone()
            .ok_or(StorageError::MissingCredentials("CFACTORY_S3_ACCESS_KEY"))?;
        let secret_key = config
            .s3_secret_key
            .clone()
            .ok_or(StorageError::MissingCredentials("CFACTORY_S3_SECRET_KEY"))?;

        Ok(Self {
            endpoint: config.s3_endpoint.clone(),
            region: config.s3_region.clone(),
            bucket: config.s3_bucket.clone(),
            access_key,
            secret_key,
        })
    }
}

pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    #[must_use]
    pub fn new(settings: S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key,
            settings.secret_key,
            None,
            None,
            "cfactory-static",
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region))
            .credentials_provider(credentials)
            // MinIO and most self-hosted stores only serve path-style URLs.
            .force_path_style(true);
        if let Some(endpoint) = settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket,
        }
    }

    /// Builds a store from the application config.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingCredentials`] if credentials are unset.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, StorageError> {
        Ok(Self::new(S3Settings::from_app_config(config)?))
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn content_type_for(object_key: &str) -> &'static str {
    if object_key.ends_with(".zip") {
        "application/zip"
    } else if object_key.ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn upload(&self, local_path: &Path, object_key: &str) -> Result<(), StorageError> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::Upload {
                key: object_key.to_string(),
                message: format!("reading {}: {e}", local_path.display()),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .content_type(content_type_for(object_key))
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: object_key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::info!(bucket = %self.bucket, key = object_key, "uploaded object");
        Ok(())
    }

    async fn presigned_url(
        &self,
        object_key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let presign_error = |message: String| StorageError::Presign {
            key: object_key.to_string(),
            message,
        };

        let config = PresigningConfig::expires_in(ttl).map_err(|e| presign_error(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_key)
            .presigned(config)
            .await
            .map_err(|e| presign_error(DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_string())
    }
}
