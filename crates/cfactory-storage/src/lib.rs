//! Object storage for packaged carousels.
//!
//! After [`ObjectStore::upload`] returns `Ok`, a link from
//! [`ObjectStore::presigned_url`] for the same key serves the uploaded bytes
//! until the object is deleted or the link expires.

pub mod error;
pub mod s3;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

pub use error::StorageError;
pub use s3::{S3Settings, S3Storage};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the file at `local_path` under `object_key`, replacing any existing object.
    async fn upload(&self, local_path: &Path, object_key: &str) -> Result<(), StorageError>;

    /// Returns a time-limited GET link for `object_key`.
    async fn presigned_url(&self, object_key: &str, ttl: Duration)
        -> Result<String, StorageError>;
}

/// Object key under which a plan's carousel archive is stored.
#[must_use]
pub fn carousel_object_key(plan_id: i64) -> String {
    format!("carousels/carousel_{plan_id}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carousel_key_is_derived_from_plan_id() {
        assert_eq!(carousel_object_key(42), "carousels/carousel_42.zip");
    }
}
