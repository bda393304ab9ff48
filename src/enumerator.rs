//! Streaming enumeration of object versions.
//!
//! The enumerator spawns the storage listing onto its own task and hands
//! the caller a bounded receiver, so deletion can start before the listing
//! finishes and memory stays bounded by the queue size.

use anyhow::Result;
use async_channel::Receiver;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::storage::Storage;
use crate::types::VersionRef;

pub struct VersionEnumerator {
    storage: Storage,
    max_keys: i32,
    queue_size: usize,
}

impl VersionEnumerator {
    pub fn new(storage: Storage, max_keys: i32, queue_size: u32) -> Self {
        Self {
            storage,
            max_keys,
            queue_size: queue_size.max(1) as usize,
        }
    }

    /// Start listing all versions and delete markers under the prefix.
    ///
    /// Returns the receiving end of the channel plus the join handle of the
    /// listing task. The sender is dropped when the listing completes, so
    /// channel closure signals end of enumeration. The caller must await
    /// the handle to observe listing failures; dropping the receiver early
    /// makes the listing task finish with `Ok`.
    pub fn enumerate(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> (Receiver<VersionRef>, JoinHandle<Result<()>>) {
        let (sender, receiver) = async_channel::bounded(self.queue_size);

        let storage = self.storage.clone();
        let bucket = bucket.to_string();
        let prefix = prefix.to_string();
        let max_keys = self.max_keys;

        let handle = tokio::spawn(async move {
            debug!(bucket = bucket.as_str(), prefix = prefix.as_str(), "version listing started.");
            let result = storage
                .list_object_versions(&bucket, &prefix, &sender, max_keys)
                .await;
            debug!(bucket = bucket.as_str(), "version listing finished.");
            result
        });

        (receiver, handle)
    }
}
