//! Batch deletion using the S3 DeleteObjects API.
//!
//! Groups version references into batches of up to 1000 and calls the S3
//! batch delete API for each group. Partial failures are reported per key
//! in the returned result.

use anyhow::Result;
use aws_sdk_s3::types::ObjectIdentifier;
use tracing::{debug, info, warn};

use crate::storage::Storage;
use crate::types::VersionRef;

/// Maximum objects per batch DeleteObjects API call (S3 limit).
pub const MAX_BATCH_SIZE: usize = 1000;

/// Result of a batch deletion, reporting which keys succeeded and which failed.
#[derive(Debug, Clone, Default)]
pub struct DeleteResult {
    /// Keys (with optional version IDs) that were successfully deleted.
    pub deleted: Vec<DeletedKey>,
    /// Keys that failed with error details.
    pub failed: Vec<FailedKey>,
}

/// A successfully deleted key.
#[derive(Debug, Clone)]
pub struct DeletedKey {
    pub key: String,
    pub version_id: Option<String>,
}

/// A key that failed to delete.
#[derive(Debug, Clone)]
pub struct FailedKey {
    pub key: String,
    pub version_id: Option<String>,
    pub error_code: String,
    pub error_message: String,
}

impl FailedKey {
    /// One-line description used in the error record and error details.
    pub fn describe(&self) -> String {
        format!(
            "{}: {} ({})",
            self.key, self.error_code, self.error_message
        )
    }
}

/// Deletes object versions in batches via the S3 DeleteObjects API.
///
/// Bound to one bucket for its lifetime. In dry-run mode no S3 API call is
/// made; every reference is reported as deleted with a `[dry-run]` log line.
pub struct BatchDeleter {
    storage: Storage,
    bucket: String,
    batch_size: usize,
    dry_run: bool,
}

impl BatchDeleter {
    pub fn new(storage: Storage, bucket: &str, batch_size: u16, dry_run: bool) -> Self {
        Self {
            storage,
            bucket: bucket.to_string(),
            batch_size: (batch_size as usize).clamp(1, MAX_BATCH_SIZE),
            dry_run,
        }
    }

    pub async fn delete(&self, refs: &[VersionRef]) -> Result<DeleteResult> {
        let mut result = DeleteResult::default();

        if refs.is_empty() {
            return Ok(result);
        }

        if self.dry_run {
            for version_ref in refs {
                info!(
                    bucket = self.bucket.as_str(),
                    key = version_ref.key.as_str(),
                    version_id = version_ref.version_id.as_deref().unwrap_or(""),
                    delete_marker = version_ref.is_delete_marker,
                    "[dry-run] delete completed.",
                );
                result.deleted.push(DeletedKey {
                    key: version_ref.key.clone(),
                    version_id: version_ref.version_id.clone(),
                });
            }
            return Ok(result);
        }

        for chunk in refs.chunks(self.batch_size) {
            let identifiers: Vec<ObjectIdentifier> = chunk
                .iter()
                .map(|version_ref| {
                    let mut builder = ObjectIdentifier::builder().key(&version_ref.key);
                    if let Some(ref version_id) = version_ref.version_id {
                        builder = builder.version_id(version_id);
                    }
                    builder.build().expect("ObjectIdentifier build failed")
                })
                .collect();

            debug!(
                bucket = self.bucket.as_str(),
                batch_size = identifiers.len(),
                "sending DeleteObjects batch request."
            );

            let response = self
                .storage
                .delete_objects(&self.bucket, identifiers)
                .await?;

            for deleted in response.deleted() {
                let key = deleted.key().unwrap_or_default().to_string();
                let version_id = deleted.version_id().map(String::from);
                info!(
                    bucket = self.bucket.as_str(),
                    key = key.as_str(),
                    version_id = version_id.as_deref().unwrap_or(""),
                    "delete completed.",
                );
                result.deleted.push(DeletedKey { key, version_id });
            }

            for err in response.errors() {
                let key = err.key().unwrap_or("unknown").to_string();
                let version_id = err.version_id().map(String::from);
                let code = err.code().unwrap_or("unknown").to_string();
                let message = err.message().unwrap_or("no message").to_string();

                warn!(
                    bucket = self.bucket.as_str(),
                    key = key.as_str(),
                    version_id = version_id.as_deref().unwrap_or(""),
                    code = code.as_str(),
                    message = message.as_str(),
                    "S3 DeleteObjects partial failure for key '{}': {} ({}).",
                    key,
                    code,
                    message,
                );
                result.failed.push(FailedKey {
                    key,
                    version_id,
                    error_code: code,
                    error_message: message,
                });
            }

            debug!(
                deleted = result.deleted.len(),
                failed = result.failed.len(),
                "DeleteObjects batch completed."
            );
        }

        Ok(result)
    }
}
