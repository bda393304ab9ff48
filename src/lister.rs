//! Read-only listing for the `ls` subcommand.
//!
//! Prints `s3://` URIs, one per line, either for all buckets or for the
//! current objects under a bucket/prefix. Never mutates anything.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::debug;

use crate::storage::Storage;

pub struct Lister {
    storage: Storage,
    max_keys: i32,
    queue_size: usize,
}

impl Lister {
    pub fn new(storage: Storage, max_keys: i32, queue_size: u32) -> Self {
        Self {
            storage,
            max_keys,
            queue_size: queue_size.max(1) as usize,
        }
    }

    /// Print one `s3://bucket` line per bucket in the account.
    pub async fn list_buckets<W: Write>(&self, writer: &mut W) -> Result<()> {
        let buckets = self.storage.list_buckets().await?;

        for bucket in buckets {
            writeln!(writer, "s3://{bucket}").context("failed to write listing output.")?;
        }

        Ok(())
    }

    /// Print one `s3://bucket/key` line per current object under the prefix.
    pub async fn list_objects<W: Write>(
        &self,
        bucket: &str,
        prefix: &str,
        writer: &mut W,
    ) -> Result<()> {
        debug!(bucket = bucket, prefix = prefix, "object listing started.");

        let (sender, receiver) = async_channel::bounded(self.queue_size);

        let storage = self.storage.clone();
        let list_bucket = bucket.to_string();
        let list_prefix = prefix.to_string();
        let max_keys = self.max_keys;
        let handle = tokio::spawn(async move {
            storage
                .list_objects(&list_bucket, &list_prefix, &sender, max_keys)
                .await
        });

        while let Ok(key) = receiver.recv().await {
            writeln!(writer, "s3://{bucket}/{key}").context("failed to write listing output.")?;
        }

        handle
            .await
            .context("listing task failed.")?
            .context("object listing failed.")?;

        debug!(bucket = bucket, "object listing completed.");
        Ok(())
    }
}
