//! Per-target processing: enumerate, batch-delete, and for whole-bucket
//! targets probe emptiness and remove the bucket itself.

use async_channel::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::deleter::BatchDeleter;
use crate::enumerator::VersionEnumerator;
use crate::storage::Storage;
use crate::types::error::SweepError;
use crate::types::token::RunCancellationToken;
use crate::types::{Target, TargetOutcome, VersionRef};

/// Intermediate result carrying the confirmed deletion count even on
/// failure, since a target can fail after some batches already succeeded.
type StepResult = Result<u64, (u64, SweepError)>;

/// Processes one removal target at a time.
///
/// Object targets delete every version and delete marker of exactly one
/// key. Bucket targets clear all content first, then probe that the bucket
/// is really empty before deleting the bucket itself.
pub struct TargetProcessor {
    storage: Storage,
    config: Config,
    cancellation_token: RunCancellationToken,
}

impl TargetProcessor {
    pub fn new(storage: Storage, config: Config, cancellation_token: RunCancellationToken) -> Self {
        Self {
            storage,
            config,
            cancellation_token,
        }
    }

    pub async fn process(&self, target: &Target) -> TargetOutcome {
        let result = if target.is_bucket() {
            self.process_bucket(target).await
        } else {
            self.process_object(target).await
        };

        match result {
            Ok(deleted_count) => TargetOutcome {
                target: target.clone(),
                deleted_count,
                error: None,
            },
            Err((deleted_count, error)) => TargetOutcome {
                target: target.clone(),
                deleted_count,
                error: Some(error),
            },
        }
    }

    /// Delete every version and delete marker of exactly `target.key`.
    ///
    /// The key is used as the listing prefix, so neighbors sharing the
    /// prefix (e.g. `a.txt.bak` next to `a.txt`) come back from the listing
    /// and must be filtered out before deletion.
    async fn process_object(&self, target: &Target) -> StepResult {
        let enumerator = VersionEnumerator::new(
            self.storage.clone(),
            self.config.max_keys,
            self.config.listing_queue_size,
        );
        let (receiver, listing_handle) = enumerator.enumerate(&target.bucket, &target.key);

        self.drain_and_delete(target, receiver, listing_handle, Some(&target.key))
            .await
    }

    /// Clear all bucket content, verify emptiness, then delete the bucket.
    async fn process_bucket(&self, target: &Target) -> StepResult {
        let enumerator = VersionEnumerator::new(
            self.storage.clone(),
            self.config.max_keys,
            self.config.listing_queue_size,
        );
        let (receiver, listing_handle) = enumerator.enumerate(&target.bucket, "");

        let deleted_count = self
            .drain_and_delete(target, receiver, listing_handle, None)
            .await?;

        if self.config.dry_run {
            info!(bucket = target.bucket.as_str(), "[dry-run] bucket delete completed.");
            return Ok(deleted_count);
        }

        if self.cancellation_token.is_cancelled() {
            return Err((deleted_count, SweepError::Cancelled));
        }

        let has_objects = self
            .storage
            .bucket_has_objects(&target.bucket)
            .await
            .map_err(|e| {
                (
                    deleted_count,
                    SweepError::Backend {
                        target: target.uri(),
                        detail: format!("{e:#}"),
                    },
                )
            })?;

        if has_objects {
            return Err((
                deleted_count,
                SweepError::BucketNotEmpty(target.bucket.clone()),
            ));
        }

        // Unreachable through the worklist parser; guards direct library
        // callers from deleting a bucket whose name was given with a path.
        if target.bucket.contains('/') {
            warn!(
                bucket = target.bucket.as_str(),
                "bucket name contains a path separator; skipping bucket deletion."
            );
            return Ok(deleted_count);
        }

        self.storage
            .delete_bucket(&target.bucket)
            .await
            .map_err(|e| {
                (
                    deleted_count,
                    SweepError::Backend {
                        target: target.uri(),
                        detail: format!("{e:#}"),
                    },
                )
            })?;

        info!(bucket = target.bucket.as_str(), "bucket delete completed.");
        Ok(deleted_count)
    }

    /// Receive version references, buffer them to batch size, and delete.
    ///
    /// On any failure the receiver is dropped so the listing task winds
    /// down on its closed channel, then the listing handle is awaited
    /// before returning. On clean channel closure the handle is awaited to
    /// surface listing errors that happened after the last send.
    async fn drain_and_delete(
        &self,
        target: &Target,
        receiver: Receiver<VersionRef>,
        listing_handle: JoinHandle<anyhow::Result<()>>,
        exact_key: Option<&str>,
    ) -> StepResult {
        let deleter = BatchDeleter::new(
            self.storage.clone(),
            &target.bucket,
            self.config.batch_size,
            self.config.dry_run,
        );
        let batch_size = self.config.batch_size.max(1) as usize;

        let mut buffer: Vec<VersionRef> = Vec::with_capacity(batch_size);
        let mut deleted_count: u64 = 0;

        loop {
            let recv_result = receiver.recv().await;
            match recv_result {
                Ok(version_ref) => {
                    if self.cancellation_token.is_cancelled() {
                        drop(receiver);
                        let _ = listing_handle.await;
                        return Err((deleted_count, SweepError::Cancelled));
                    }

                    if let Some(key) = exact_key {
                        if version_ref.key != key {
                            debug!(
                                bucket = target.bucket.as_str(),
                                key = version_ref.key.as_str(),
                                "skipping prefix neighbor of the requested key."
                            );
                            continue;
                        }
                    }

                    buffer.push(version_ref);
                    if buffer.len() >= batch_size {
                        if let Err(error) =
                            Self::flush(&deleter, target, &mut buffer, &mut deleted_count).await
                        {
                            drop(receiver);
                            let _ = listing_handle.await;
                            return Err((deleted_count, error));
                        }
                    }
                }
                // Channel closed: listing finished, flush the remainder.
                Err(_) => {
                    if let Err(error) =
                        Self::flush(&deleter, target, &mut buffer, &mut deleted_count).await
                    {
                        let _ = listing_handle.await;
                        return Err((deleted_count, error));
                    }
                    break;
                }
            }
        }

        match listing_handle.await {
            Ok(Ok(())) => Ok(deleted_count),
            Ok(Err(e)) => Err((
                deleted_count,
                SweepError::Backend {
                    target: target.uri(),
                    detail: format!("{e:#}"),
                },
            )),
            Err(e) => Err((
                deleted_count,
                SweepError::Backend {
                    target: target.uri(),
                    detail: format!("listing task failed: {e}"),
                },
            )),
        }
    }

    async fn flush(
        deleter: &BatchDeleter,
        target: &Target,
        buffer: &mut Vec<VersionRef>,
        deleted_count: &mut u64,
    ) -> Result<(), SweepError> {
        if buffer.is_empty() {
            return Ok(());
        }

        let batch = std::mem::take(buffer);
        let result = deleter.delete(&batch).await.map_err(|e| SweepError::Backend {
            target: target.uri(),
            detail: format!("{e:#}"),
        })?;

        *deleted_count += result.deleted.len() as u64;

        if let Some(first_failed) = result.failed.first() {
            return Err(SweepError::Backend {
                target: target.uri(),
                detail: first_failed.describe(),
            });
        }

        Ok(())
    }
}
