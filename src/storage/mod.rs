use anyhow::Result;
use async_channel::Sender;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::types::ObjectIdentifier;
use dyn_clone::DynClone;
use std::sync::Arc;

use crate::config::Config;
use crate::types::VersionRef;
use crate::types::token::RunCancellationToken;

pub mod s3;

/// Type alias for a boxed Storage trait object.
pub type Storage = Box<dyn StorageTrait + Send + Sync>;

/// Core storage trait for the S3 operations the sweep engine needs.
///
/// A single storage instance serves a whole run; the bucket is a parameter
/// on every call because one worklist can name many buckets.
#[async_trait]
pub trait StorageTrait: DynClone {
    /// List bucket names owned by the caller's account.
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// List current objects (non-versioned view) under a prefix and send
    /// their keys to the provided channel.
    ///
    /// Listing failures are treated as unrecoverable errors.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        sender: &Sender<String>,
        max_keys: i32,
    ) -> Result<()>;

    /// List all object versions and delete markers under a prefix and send
    /// them to the provided channel.
    ///
    /// Listing failures are treated as unrecoverable errors.
    async fn list_object_versions(
        &self,
        bucket: &str,
        prefix: &str,
        sender: &Sender<VersionRef>,
        max_keys: i32,
    ) -> Result<()>;

    /// Delete multiple objects in a single request via DeleteObjects batch API.
    ///
    /// Supports up to 1000 objects per request; the caller is responsible
    /// for batching. Returns DeleteObjectsOutput containing both
    /// successfully deleted objects and per-object errors (partial failure).
    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectIdentifier>,
    ) -> Result<DeleteObjectsOutput>;

    /// Check whether a bucket still contains at least one current object.
    ///
    /// Used as the post-clear probe before a bucket deletion.
    async fn bucket_has_objects(&self, bucket: &str) -> Result<bool>;

    /// Delete an empty bucket via DeleteBucket API.
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Get the underlying AWS S3 Client for direct API access.
    fn get_client(&self) -> Option<Arc<Client>>;
}

dyn_clone::clone_trait_object!(StorageTrait);

/// Create the S3 storage instance for a run.
///
/// The client is only built when the config carries client settings; a
/// `None` client is for tests that never reach the network.
pub async fn create_storage(config: &Config, cancellation_token: RunCancellationToken) -> Storage {
    let client = if let Some(ref client_config) = config.client_config {
        Some(Arc::new(client_config.create_client().await))
    } else {
        None
    };

    Box::new(s3::S3Storage::new(client, cancellation_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_dummy_tracing_subscriber, make_test_config};
    use crate::types::token::create_run_cancellation_token;

    #[tokio::test]
    async fn create_s3_storage_with_credentials() {
        init_dummy_tracing_subscriber();

        let config = make_test_config();
        let cancellation_token = create_run_cancellation_token();

        let storage = create_storage(&config, cancellation_token).await;

        assert!(storage.get_client().is_some());
    }

    #[tokio::test]
    async fn create_s3_storage_no_client_config() {
        init_dummy_tracing_subscriber();

        let mut config = make_test_config();
        config.client_config = None;
        let cancellation_token = create_run_cancellation_token();

        let storage = create_storage(&config, cancellation_token).await;

        assert!(storage.get_client().is_none());
    }

    #[tokio::test]
    async fn storage_is_cloneable() {
        init_dummy_tracing_subscriber();

        let mut config = make_test_config();
        config.client_config = None;
        let cancellation_token = create_run_cancellation_token();

        let storage = create_storage(&config, cancellation_token).await;
        let cloned = storage.clone();

        assert!(cloned.get_client().is_none());
    }
}
