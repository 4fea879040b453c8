//! S3-compatible blob backend.
//!
//! Objects are written as-is with string user metadata. Per-object expiry
//! is recorded in the `expires-at` metadata entry and enforced on read;
//! bucket lifecycle rules are expected to reclaim the space eventually.

use crate::backend::{BlobBackend, StoredObject};
use crate::config::S3Config;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// User metadata key carrying the RFC 3339 expiry instant.
pub const EXPIRES_AT_METADATA: &str = "expires-at";

/// S3 backend bound to one bucket.
pub struct S3Backend {
    client: S3Client,
    bucket: String,
}

impl S3Backend {
    /// Builds a client from configuration.
    ///
    /// Static access keys are used when both are configured; otherwise
    /// credentials come from the default AWS provider chain.
    pub async fn from_config(config: &S3Config) -> StoreResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StoreError::Config("s3 bucket must be set".to_string()));
        }

        let region = aws_types::region::Region::new(config.region.clone());

        let mut config_builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials = aws_credential_types::Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "docvault-static",
                );
                aws_sdk_s3::Config::builder()
                    .region(region)
                    .credentials_provider(credentials)
                    .behavior_version_latest()
            }
            _ => {
                let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&sdk_config)
            }
        };

        if let Some(ref endpoint) = config.endpoint_override {
            config_builder = config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        Ok(Self::with_client(
            S3Client::from_conf(config_builder.build()),
            config.bucket.clone(),
        ))
    }

    pub fn with_client(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn expires_at(metadata: &HashMap<String, String>) -> Option<DateTime<Utc>> {
    metadata
        .get(EXPIRES_AT_METADATA)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc))
}

fn is_expired(metadata: &HashMap<String, String>) -> bool {
    expires_at(metadata).is_some_and(|at| at <= Utc::now())
}

#[async_trait]
impl BlobBackend for S3Backend {
    async fn put(&self, key: &str, object: StoredObject, ttl: Option<Duration>) -> StoreResult<()> {
        let size = object.bytes.len();

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(object.bytes));

        for (name, value) in object.metadata {
            request = request.metadata(name, value);
        }

        if let Some(ttl) = ttl {
            let at = chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                .ok_or_else(|| StoreError::Backend(format!("ttl {ttl:?} out of range")))?;
            request = request.metadata(EXPIRES_AT_METADATA, at.to_rfc3339());
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("put failed for {key}: {e}")))?;

        debug!("uploaded {size} bytes to s3://{}/{key}", self.bucket);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(StoreError::Backend(format!(
                    "get failed for {key}: {service_err}"
                )));
            }
        };

        let metadata = resp.metadata().cloned().unwrap_or_default();
        if is_expired(&metadata) {
            debug!("s3://{}/{key} is past its expiry", self.bucket);
            return Ok(None);
        }

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Backend(format!("failed to read body for {key}: {e}")))?;

        let bytes = body.into_bytes().to_vec();
        debug!(
            "downloaded {} bytes from s3://{}/{key}",
            bytes.len(),
            self.bucket
        );
        Ok(Some(StoredObject { bytes, metadata }))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        // DeleteObject succeeds for missing keys, so look first.
        let live = match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(head) => !head.metadata().is_some_and(is_expired),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    return Ok(false);
                }
                return Err(StoreError::Backend(format!(
                    "head object failed for {key}: {service_err}"
                )));
            }
        };

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("delete failed for {key}: {e}")))?;

        debug!("deleted s3://{}/{key}", self.bucket);
        Ok(live)
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("bucket {} unreachable: {e}", self.bucket)))?;
        Ok(())
    }
}
