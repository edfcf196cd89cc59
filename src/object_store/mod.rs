//! Object storage for uploaded import files.
//!
//! ## Backends
//!
//! - `MemoryObjectStore` - In-memory buckets for tests and local runs
//! - `S3ObjectStore` (feature: s3) - Amazon S3
//!
//! ## Moves
//!
//! Object stores have no rename. `move_object` copies, deletes the source,
//! then confirms the source is gone. A crash between copy and delete leaves
//! the object in both places; re-running the move overwrites the destination
//! and finishes the delete.

mod event;
mod memory;
#[cfg(feature = "s3")]
mod s3;

pub use event::{BucketRef, ObjectCreatedEvent, ObjectRef, S3Entity, S3EventRecord};
pub use memory::MemoryObjectStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

use std::pin::Pin;

use async_trait::async_trait;
use backon::Retryable;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{info, warn};

use crate::utils::retry::archive_backoff;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Failed to read object: {0}")]
    ReadFailed(String),

    #[error("Failed to copy object: {0}")]
    CopyFailed(String),

    #[error("Failed to delete object: {0}")]
    DeleteFailed(String),

    #[error("Object {bucket}/{key} still present after delete")]
    MoveIncomplete { bucket: String, key: String },
}

/// Result type for object store operations.
pub type Result<T> = std::result::Result<T, ObjectStoreError>;

/// Streaming body of a stored object.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Storage backend holding uploaded files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open a streamed read of an object.
    async fn open(&self, bucket: &str, key: &str) -> Result<ObjectReader>;

    /// Copy an object within a bucket, overwriting any existing destination.
    async fn copy(&self, bucket: &str, source_key: &str, dest_key: &str) -> Result<()>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// Check whether an object exists.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;
}

/// Move an object by copy-then-delete, verifying the source is gone.
pub async fn move_object(
    store: &dyn ObjectStore,
    bucket: &str,
    from: &str,
    to: &str,
) -> Result<()> {
    store.copy(bucket, from, to).await?;

    let remove = || async move {
        store.delete(bucket, from).await?;
        if store.exists(bucket, from).await? {
            return Err(ObjectStoreError::MoveIncomplete {
                bucket: bucket.to_string(),
                key: from.to_string(),
            });
        }
        Ok(())
    };

    remove
        .retry(archive_backoff())
        .when(|e: &ObjectStoreError| matches!(e, ObjectStoreError::MoveIncomplete { .. }))
        .notify(|e: &ObjectStoreError, delay: std::time::Duration| {
            warn!(bucket = %bucket, key = %from, error = %e, ?delay, "Retrying delete of moved object");
        })
        .await?;

    info!(bucket = %bucket, from = %from, to = %to, "Moved object");
    Ok(())
}

#[cfg(test)]
mod tests;
