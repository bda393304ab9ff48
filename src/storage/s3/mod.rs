pub mod client_builder;

use anyhow::{Context, Result};
use async_channel::Sender;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use std::sync::Arc;

use crate::storage::StorageTrait;
use crate::types::VersionRef;
use crate::types::token::RunCancellationToken;

/// Extracts the S3 error code and message from an AWS SDK error.
///
/// For service errors (S3 API responses), returns the S3 error code
/// (e.g. "AccessDenied", "NoSuchBucket") and the human-readable error
/// message from the response. For other error types (network, timeout,
/// construction failure), returns "N/A" as the code and the full error
/// description as the message.
fn extract_sdk_error_details<E: std::fmt::Display + ProvideErrorMetadata>(
    e: &SdkError<E>,
) -> (String, String) {
    if let Some(service_err) = e.as_service_error() {
        (
            service_err.code().unwrap_or("unknown").to_string(),
            service_err.message().unwrap_or("no message").to_string(),
        )
    } else {
        ("N/A".to_string(), e.to_string())
    }
}

/// S3 storage implementation backed by the AWS SDK.
///
/// The client is `None` only in tests that never reach the network.
#[derive(Clone)]
pub struct S3Storage {
    client: Option<Arc<Client>>,
    cancellation_token: RunCancellationToken,
}

impl S3Storage {
    pub fn new(client: Option<Arc<Client>>, cancellation_token: RunCancellationToken) -> Self {
        Self {
            client,
            cancellation_token,
        }
    }
}

#[async_trait]
impl StorageTrait for S3Storage {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let mut buckets = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .as_ref()
                .unwrap()
                .list_buckets()
                .set_continuation_token(continuation_token.clone())
                .send()
                .await
                .map_err(|e| {
                    let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                    tracing::error!(
                        s3_error_code = s3_error_code,
                        s3_error_message = s3_error_message,
                        "S3 ListBuckets API call failed: {} ({}).",
                        s3_error_code,
                        s3_error_message,
                    );
                    anyhow::anyhow!(e).context("aws_sdk_s3::client::list_buckets() failed.")
                })?;

            for bucket in output.buckets() {
                if let Some(name) = bucket.name() {
                    buckets.push(name.to_string());
                }
            }

            continuation_token = output.continuation_token().map(String::from);
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(buckets)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        sender: &Sender<String>,
        max_keys: i32,
    ) -> Result<()> {
        let mut continuation_token: Option<String> = None;

        loop {
            if self.cancellation_token.is_cancelled() {
                tracing::info!(bucket = bucket, "Listing cancelled.");
                break;
            }

            let output = self
                .client
                .as_ref()
                .unwrap()
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.clone())
                .max_keys(max_keys)
                .send()
                .await
                .map_err(|e| {
                    let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                    tracing::error!(
                        bucket = bucket,
                        prefix = prefix,
                        s3_error_code = s3_error_code,
                        s3_error_message = s3_error_message,
                        "S3 ListObjectsV2 API call failed for s3://{}/{}: {} ({}).",
                        bucket,
                        prefix,
                        s3_error_code,
                        s3_error_message,
                    );
                    anyhow::anyhow!(e).context("aws_sdk_s3::client::list_objects_v2() failed.")
                })?;

            for object in output.contents() {
                if self.cancellation_token.is_cancelled() {
                    return Ok(());
                }

                let key = object.key().unwrap_or_default().to_string();
                if let Err(e) = sender
                    .send(key)
                    .await
                    .context("async_channel::Sender::send() failed.")
                {
                    return if !sender.is_closed() { Err(e) } else { Ok(()) };
                }
            }

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(())
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
        prefix: &str,
        sender: &Sender<VersionRef>,
        max_keys: i32,
    ) -> Result<()> {
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            if self.cancellation_token.is_cancelled() {
                tracing::info!(bucket = bucket, "Version listing cancelled.");
                break;
            }

            let output = self
                .client
                .as_ref()
                .unwrap()
                .list_object_versions()
                .bucket(bucket)
                .prefix(prefix)
                .set_key_marker(key_marker.clone())
                .set_version_id_marker(version_id_marker.clone())
                .max_keys(max_keys)
                .send()
                .await
                .map_err(|e| {
                    let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                    tracing::error!(
                        bucket = bucket,
                        prefix = prefix,
                        s3_error_code = s3_error_code,
                        s3_error_message = s3_error_message,
                        "S3 ListObjectVersions API call failed for s3://{}/{}: {} ({}).",
                        bucket,
                        prefix,
                        s3_error_code,
                        s3_error_message,
                    );
                    anyhow::anyhow!(e).context("aws_sdk_s3::client::list_object_versions() failed.")
                })?;

            for version in output.versions() {
                if self.cancellation_token.is_cancelled() {
                    return Ok(());
                }

                if let Err(e) = sender
                    .send(VersionRef::from_version(version))
                    .await
                    .context("async_channel::Sender::send() failed.")
                {
                    return if !sender.is_closed() { Err(e) } else { Ok(()) };
                }
            }

            for marker in output.delete_markers() {
                if self.cancellation_token.is_cancelled() {
                    return Ok(());
                }

                if let Err(e) = sender
                    .send(VersionRef::from_delete_marker(marker))
                    .await
                    .context("async_channel::Sender::send() failed.")
                {
                    return if !sender.is_closed() { Err(e) } else { Ok(()) };
                }
            }

            if output.is_truncated() == Some(true) {
                key_marker = output.next_key_marker().map(String::from);
                version_id_marker = output.next_version_id_marker().map(String::from);
            } else {
                break;
            }
        }

        Ok(())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectIdentifier>,
    ) -> Result<DeleteObjectsOutput> {
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .context("aws_sdk_s3::types::Delete build failed.")?;

        self.client
            .as_ref()
            .unwrap()
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = bucket,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 DeleteObjects API call failed for s3://{}: {} ({}).",
                    bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow::anyhow!(e).context("aws_sdk_s3::client::delete_objects() failed.")
            })
    }

    async fn bucket_has_objects(&self, bucket: &str) -> Result<bool> {
        let output = self
            .client
            .as_ref()
            .unwrap()
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = bucket,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 ListObjectsV2 probe failed for s3://{}: {} ({}).",
                    bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow::anyhow!(e).context("aws_sdk_s3::client::list_objects_v2() failed.")
            })?;

        Ok(output.key_count().unwrap_or(0) > 0)
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .as_ref()
            .unwrap()
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = bucket,
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 DeleteBucket API call failed for s3://{}: {} ({}).",
                    bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow::anyhow!(e).context("aws_sdk_s3::client::delete_bucket() failed.")
            })?;

        Ok(())
    }

    fn get_client(&self) -> Option<Arc<Client>> {
        self.client.clone()
    }
}
