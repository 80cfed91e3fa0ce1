//! In-process object store
//!
//! Buckets are created on first write. Contents live for the process
//! lifetime only.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ObjectStore;
use crate::error::AppError;

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Vec<u8>,
    content_type: String,
}

/// Object store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    /// bucket -> name -> object
    buckets: RwLock<HashMap<String, HashMap<String, MemoryObject>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for an object, if present
    pub async fn content_type(&self, bucket: &str, name: &str) -> Option<String> {
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .map(|object| object.content_type.clone())
    }

    /// Number of objects stored in a bucket
    pub async fn object_count(&self, bucket: &str) -> usize {
        let buckets = self.buckets.read().await;
        buckets.get(bucket).map(HashMap::len).unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket.to_string()).or_default().insert(
            name.to_string(),
            MemoryObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, AppError> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .map(|object| object.data.clone()))
    }

    async fn delete(&self, bucket: &str, name: &str) -> Result<(), AppError> {
        let mut buckets = self.buckets.write().await;
        if let Some(objects) = buckets.get_mut(bucket) {
            objects.remove(name);
        }
        Ok(())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), AppError> {
        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_same_bytes() {
        let store = MemoryObjectStore::new();
        store
            .put("public", "a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        let data = store.get("public", "a.png").await.unwrap();
        assert_eq!(data, Some(vec![1, 2, 3]));
        assert_eq!(
            store.content_type("public", "a.png").await.as_deref(),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn reupload_replaces_object() {
        let store = MemoryObjectStore::new();
        store.put("b", "x", vec![1], "text/plain").await.unwrap();
        store.put("b", "x", vec![2, 2], "text/plain").await.unwrap();

        assert_eq!(store.get("b", "x").await.unwrap(), Some(vec![2, 2]));
        assert_eq!(store.object_count("b").await, 1);
    }

    #[tokio::test]
    async fn missing_bucket_or_object_is_absent() {
        let store = MemoryObjectStore::new();
        assert_eq!(store.get("nope", "x").await.unwrap(), None);

        store.ensure_bucket("b").await.unwrap();
        assert_eq!(store.get("b", "x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryObjectStore::new();
        store.put("b", "x", vec![1], "text/plain").await.unwrap();

        store.delete("b", "x").await.unwrap();
        store.delete("b", "x").await.unwrap();
        store.delete("other", "x").await.unwrap();

        assert_eq!(store.get("b", "x").await.unwrap(), None);
    }
}
