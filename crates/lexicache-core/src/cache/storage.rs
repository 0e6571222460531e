//! Bucket storage backends.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use super::StoredResponse;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid bucket name: {0:?}")]
    InvalidBucket(String),
}

/// Host-managed set of named cache buckets.
///
/// Buckets are keyed by request URL. An entry is only ever replaced whole,
/// never patched in place.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open `bucket`, creating it if it does not exist.
    async fn open(&self, bucket: &str) -> Result<(), StorageError>;

    /// Names of every existing bucket.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Delete `bucket`. Returns false if there was nothing to delete.
    async fn delete(&self, bucket: &str) -> Result<bool, StorageError>;

    /// Exact-URL lookup. A missing bucket is a miss, not an error.
    async fn lookup(&self, bucket: &str, url: &str)
        -> Result<Option<StoredResponse>, StorageError>;

    /// Store `entry` under its URL, replacing any previous entry.
    async fn put(&self, bucket: &str, entry: StoredResponse) -> Result<(), StorageError>;
}

/// In-process storage. Buckets vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    buckets: RwLock<BTreeMap<String, HashMap<String, StoredResponse>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in `bucket`, if it exists.
    pub async fn bucket_len(&self, bucket: &str) -> Option<usize> {
        self.buckets.read().await.get(bucket).map(HashMap::len)
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, bucket: &str) -> Result<(), StorageError> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, StorageError> {
        Ok(self.buckets.write().await.remove(bucket).is_some())
    }

    async fn lookup(
        &self,
        bucket: &str,
        url: &str,
    ) -> Result<Option<StoredResponse>, StorageError> {
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .and_then(|entries| entries.get(url))
            .cloned())
    }

    async fn put(&self, bucket: &str, entry: StoredResponse) -> Result<(), StorageError> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(entry.url.clone(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Response;

    fn stored(url: &str, body: &str) -> StoredResponse {
        StoredResponse::from_response(Response::new(url, 200, body))
    }

    #[tokio::test]
    async fn test_open_creates_empty_bucket() {
        let storage = MemoryStorage::new();
        storage.open("v1").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
        assert_eq!(storage.bucket_len("v1").await, Some(0));
    }

    #[tokio::test]
    async fn test_put_then_lookup_exact_url() {
        let storage = MemoryStorage::new();
        storage.put("v1", stored("http://x/a.json", "{}")).await.unwrap();

        let hit = storage.lookup("v1", "http://x/a.json").await.unwrap();
        assert_eq!(hit.unwrap().body, b"{}");
        assert!(storage.lookup("v1", "http://x/a.json?x=1").await.unwrap().is_none());
        assert!(storage.lookup("v2", "http://x/a.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let storage = MemoryStorage::new();
        storage.open("v1").await.unwrap();
        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
