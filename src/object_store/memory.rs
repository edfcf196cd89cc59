//! In-memory object store for testing and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{ObjectReader, ObjectStore, ObjectStoreError, Result};

type ObjectKey = (String, String);

/// Object store that keeps objects in memory.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectKey, Bytes>>,
    fail_on_copy: RwLock<bool>,
    fail_on_delete: RwLock<bool>,
    /// Deletes that report success without removing anything.
    ignored_deletes: RwLock<u32>,
    delete_calls: RwLock<u32>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    pub async fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys in a bucket, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub async fn set_fail_on_copy(&self, fail: bool) {
        *self.fail_on_copy.write().await = fail;
    }

    pub async fn set_fail_on_delete(&self, fail: bool) {
        *self.fail_on_delete.write().await = fail;
    }

    /// Make the next `count` deletes succeed without removing the object.
    pub async fn ignore_next_deletes(&self, count: u32) {
        *self.ignored_deletes.write().await = count;
    }

    pub async fn delete_calls(&self) -> u32 {
        *self.delete_calls.read().await
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn open(&self, bucket: &str, key: &str) -> Result<ObjectReader> {
        let data = self
            .get(bucket, key)
            .await
            .ok_or_else(|| ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        Ok(Box::pin(std::io::Cursor::new(data)))
    }

    async fn copy(&self, bucket: &str, source_key: &str, dest_key: &str) -> Result<()> {
        if *self.fail_on_copy.read().await {
            return Err(ObjectStoreError::CopyFailed(
                "Mock copy failure".to_string(),
            ));
        }
        let mut objects = self.objects.write().await;
        let data = objects
            .get(&(bucket.to_string(), source_key.to_string()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: source_key.to_string(),
            })?;
        objects.insert((bucket.to_string(), dest_key.to_string()), data);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        *self.delete_calls.write().await += 1;
        if *self.fail_on_delete.read().await {
            return Err(ObjectStoreError::DeleteFailed(
                "Mock delete failure".to_string(),
            ));
        }
        {
            let mut ignored = self.ignored_deletes.write().await;
            if *ignored > 0 {
                *ignored -= 1;
                return Ok(());
            }
        }
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self
            .objects
            .read()
            .await
            .contains_key(&(bucket.to_string(), key.to_string())))
    }
}
