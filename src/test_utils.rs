//! Shared helpers for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::types::{DeletedObject, Error as S3Error, ObjectIdentifier};

use crate::config::{ClientConfig, Config, RetryConfig};
use crate::storage::{Storage, StorageTrait};
use crate::types::{AccessKeys, ClientConfigLocation, S3Credentials, VersionRef};

pub(crate) fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

pub(crate) fn make_test_client_config() -> ClientConfig {
    ClientConfig {
        client_config_location: ClientConfigLocation {
            aws_config_file: None,
            aws_shared_credentials_file: None,
        },
        credential: S3Credentials::Credentials {
            access_keys: AccessKeys {
                access_key: "test_key".to_string(),
                secret_access_key: "test_secret".to_string(),
                session_token: None,
            },
        },
        region: Some("us-east-1".to_string()),
        endpoint_url: Some("https://localhost:9000".to_string()),
        force_path_style: true,
        retry_config: RetryConfig {
            aws_max_attempts: 3,
            initial_backoff_milliseconds: 100,
        },
    }
}

pub(crate) fn make_test_config() -> Config {
    Config {
        client_config: Some(make_test_client_config()),
        ..Config::default()
    }
}

pub(crate) fn make_version(key: &str, version_id: &str) -> VersionRef {
    VersionRef {
        key: key.to_string(),
        version_id: Some(version_id.to_string()),
        is_delete_marker: false,
    }
}

pub(crate) fn make_delete_marker(key: &str, version_id: &str) -> VersionRef {
    VersionRef {
        key: key.to_string(),
        version_id: Some(version_id.to_string()),
        is_delete_marker: true,
    }
}

/// In-memory storage fake with call counters.
///
/// Versions live in a per-bucket map; `delete_objects` removes matching
/// entries so emptiness probes observe the effect of earlier deletions.
#[derive(Clone, Default)]
pub(crate) struct MockStorage {
    versions: Arc<Mutex<HashMap<String, Vec<VersionRef>>>>,
    /// Keys that fail with a per-object AccessDenied in delete_objects.
    pub error_keys: Arc<Mutex<HashSet<String>>>,
    /// Buckets whose version listing fails after sending what it has.
    pub fail_listing_buckets: Arc<Mutex<HashSet<String>>>,
    /// Buckets whose emptiness probe reports objects regardless of content.
    pub non_empty_probe_buckets: Arc<Mutex<HashSet<String>>>,
    pub list_versions_calls: Arc<AtomicU32>,
    pub delete_objects_calls: Arc<AtomicU32>,
    pub probe_calls: Arc<AtomicU32>,
    pub delete_bucket_calls: Arc<AtomicU32>,
    pub deleted_buckets: Arc<Mutex<Vec<String>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: &str, versions: Vec<VersionRef>) -> Self {
        self.versions
            .lock()
            .unwrap()
            .insert(bucket.to_string(), versions);
        self
    }

    pub fn boxed(&self) -> Storage {
        Box::new(self.clone())
    }

    pub fn remaining_versions(&self, bucket: &str) -> Vec<VersionRef> {
        self.versions
            .lock()
            .unwrap()
            .get(bucket)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl StorageTrait for MockStorage {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let mut buckets: Vec<String> = self.versions.lock().unwrap().keys().cloned().collect();
        buckets.sort();
        Ok(buckets)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        sender: &Sender<String>,
        _max_keys: i32,
    ) -> Result<()> {
        let mut keys: Vec<String> = self
            .versions
            .lock()
            .unwrap()
            .get(bucket)
            .map(|versions| {
                versions
                    .iter()
                    .filter(|v| v.key.starts_with(prefix) && !v.is_delete_marker)
                    .map(|v| v.key.clone())
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys.dedup();

        for key in keys {
            if sender.send(key).await.is_err() {
                return Ok(());
            }
        }
        Ok(())
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
        prefix: &str,
        sender: &Sender<VersionRef>,
        _max_keys: i32,
    ) -> Result<()> {
        self.list_versions_calls.fetch_add(1, Ordering::SeqCst);

        let matching: Vec<VersionRef> = self
            .versions
            .lock()
            .unwrap()
            .get(bucket)
            .map(|versions| {
                versions
                    .iter()
                    .filter(|v| v.key.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let fail_after_send = self.fail_listing_buckets.lock().unwrap().contains(bucket);

        for version in matching {
            if sender.send(version).await.is_err() {
                return Ok(());
            }
        }

        if fail_after_send {
            return Err(anyhow!("simulated listing failure for bucket {bucket}"));
        }
        Ok(())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectIdentifier>,
    ) -> Result<DeleteObjectsOutput> {
        self.delete_objects_calls.fetch_add(1, Ordering::SeqCst);

        let error_keys = self.error_keys.lock().unwrap().clone();
        let mut deleted = Vec::new();
        let mut errors = Vec::new();

        let mut map = self.versions.lock().unwrap();
        let bucket_versions = map.entry(bucket.to_string()).or_default();

        for object in objects {
            let key = object.key().to_string();
            let version_id = object.version_id().map(String::from);

            if error_keys.contains(&key) {
                errors.push(
                    S3Error::builder()
                        .key(&key)
                        .set_version_id(version_id)
                        .code("AccessDenied")
                        .message("simulated access denied")
                        .build(),
                );
                continue;
            }

            bucket_versions
                .retain(|v| !(v.key == key && v.version_id == version_id));
            deleted.push(
                DeletedObject::builder()
                    .key(&key)
                    .set_version_id(version_id)
                    .build(),
            );
        }

        Ok(DeleteObjectsOutput::builder()
            .set_deleted(Some(deleted))
            .set_errors(Some(errors))
            .build())
    }

    async fn bucket_has_objects(&self, bucket: &str) -> Result<bool> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);

        if self.non_empty_probe_buckets.lock().unwrap().contains(bucket) {
            return Ok(true);
        }

        Ok(self
            .versions
            .lock()
            .unwrap()
            .get(bucket)
            .is_some_and(|versions| !versions.is_empty()))
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.delete_bucket_calls.fetch_add(1, Ordering::SeqCst);
        self.deleted_buckets.lock().unwrap().push(bucket.to_string());
        self.versions.lock().unwrap().remove(bucket);
        Ok(())
    }

    fn get_client(&self) -> Option<Arc<Client>> {
        None
    }
}
