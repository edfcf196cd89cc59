//! Amazon S3 object store.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{ObjectReader, ObjectStore, ObjectStoreError, Result};

/// S3-backed object store.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create from shared SDK configuration.
    ///
    /// `force_path_style` is needed for LocalStack and most S3-compatible
    /// services.
    pub fn new(sdk_config: &SdkConfig, force_path_style: bool) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(force_path_style)
            .build();
        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// Create with explicit client (for testing).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// `CopySource` takes `bucket/key` with the key URL-encoded per segment.
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", bucket, encoded.join("/"))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn open(&self, bucket: &str, key: &str) -> Result<ObjectReader> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    ObjectStoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    ObjectStoreError::ReadFailed(format!("S3 get_object failed: {}", e))
                }
            })?;

        debug!(bucket = %bucket, key = %key, size = ?response.content_length(), "Opened S3 object");

        Ok(Box::pin(response.body.into_async_read()))
    }

    async fn copy(&self, bucket: &str, source_key: &str, dest_key: &str) -> Result<()> {
        self.client
            .copy_object()
            .bucket(bucket)
            .copy_source(copy_source(bucket, source_key))
            .key(dest_key)
            .send()
            .await
            .map_err(|e| ObjectStoreError::CopyFailed(format!("S3 copy_object failed: {}", e)))?;

        debug!(bucket = %bucket, from = %source_key, to = %dest_key, "Copied S3 object");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                ObjectStoreError::DeleteFailed(format!("S3 delete_object failed: {}", e))
            })?;
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(ObjectStoreError::ReadFailed(format!(
                "S3 head_object failed: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_source_encodes_key_segments() {
        assert_eq!(
            copy_source("bucket", "uploaded/spring catalog(2).csv"),
            "bucket/uploaded/spring%20catalog%282%29.csv"
        );
    }

    #[test]
    fn test_copy_source_plain_key() {
        assert_eq!(copy_source("bucket", "uploaded/a.csv"), "bucket/uploaded/a.csv");
    }
}
