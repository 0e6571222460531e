//! Filesystem-backed bucket storage.
//!
//! Layout: `<root>/buckets/<bucket>/<sha256(url)>.json` holds the entry
//! metadata, which names the body file `<sha256(url)>-<sha256(body)>.body`
//! next to it. Only directories under `buckets/` are ever listed or deleted,
//! so the root may be shared with other data.
//!
//! Every file is written to a `.tmp` sibling and renamed into place. The body
//! lands before the metadata that points at it, so a reader sees either the
//! previous entry or the new one, never a mix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use super::{CacheStorage, StorageError, StoredResponse};

const BUCKETS_DIR: &str = "buckets";
const META_EXTENSION: &str = "json";
const BODY_EXTENSION: &str = "body";
const TEMP_SUFFIX: &str = ".tmp";

/// On-disk metadata: the entry plus the name of its body file.
#[derive(Serialize, Deserialize)]
struct EntryFile {
    #[serde(flatten)]
    entry: StoredResponse,
    body_file: String,
}

pub struct DiskStorage {
    root: PathBuf,
    buckets: PathBuf,
}

impl DiskStorage {
    pub fn new(root: PathBuf) -> Result<Self, StorageError> {
        let buckets = root.join(BUCKETS_DIR);
        std::fs::create_dir_all(&buckets)?;
        Ok(Self { root, buckets })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bucket names must be a single, ordinary path component.
    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        if !is_plain_name(bucket) {
            return Err(StorageError::InvalidBucket(bucket.to_string()));
        }
        Ok(self.buckets.join(bucket))
    }

    fn entry_stem(url: &str) -> String {
        format!("{:x}", Sha256::digest(url.as_bytes()))
    }

    fn body_file(stem: &str, body: &[u8]) -> String {
        format!("{}-{:x}.{}", stem, Sha256::digest(body), BODY_EXTENSION)
    }

    async fn read_meta(meta_path: &Path) -> Result<Option<EntryFile>, StorageError> {
        let bytes = match fs::read(meta_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                path: meta_path.to_path_buf(),
                source,
            })
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Write `contents` to a temporary sibling, then rename it over `path`.
async fn write_replacing(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(TEMP_SUFFIX);
    let temp = PathBuf::from(temp);

    fs::write(&temp, contents).await?;
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, bucket: &str) -> Result<(), StorageError> {
        fs::create_dir_all(self.bucket_dir(bucket)?).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.buckets).await?;
        while let Some(item) = dir.next_entry().await? {
            if item.file_type().await?.is_dir() {
                if let Some(name) = item.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, bucket: &str) -> Result<bool, StorageError> {
        match fs::remove_dir_all(self.bucket_dir(bucket)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup(
        &self,
        bucket: &str,
        url: &str,
    ) -> Result<Option<StoredResponse>, StorageError> {
        let dir = self.bucket_dir(bucket)?;
        let meta_path = dir.join(Self::entry_stem(url)).with_extension(META_EXTENSION);

        let Some(EntryFile { mut entry, body_file }) = Self::read_meta(&meta_path).await? else {
            return Ok(None);
        };
        if entry.url != url {
            debug!(url = url, stored = %entry.url, "Cache entry hash collision");
            return Ok(None);
        }
        if !is_plain_name(&body_file) {
            warn!(path = %meta_path.display(), body_file = %body_file, "Ignoring cache entry with bad body path");
            return Ok(None);
        }
        entry.body = fs::read(dir.join(body_file)).await?;
        Ok(Some(entry))
    }

    async fn put(&self, bucket: &str, mut entry: StoredResponse) -> Result<(), StorageError> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).await?;
        let stem = Self::entry_stem(&entry.url);
        let meta_path = dir.join(&stem).with_extension(META_EXTENSION);

        let body = std::mem::take(&mut entry.body);
        let body_file = Self::body_file(&stem, &body);
        let previous = match Self::read_meta(&meta_path).await {
            Ok(meta) => meta.map(|m| m.body_file),
            Err(e) => {
                debug!(path = %meta_path.display(), error = %e, "Replacing unreadable cache entry");
                None
            }
        };

        let meta = serde_json::to_vec_pretty(&EntryFile {
            entry,
            body_file: body_file.clone(),
        })
        .map_err(|source| StorageError::Corrupt {
            path: meta_path.clone(),
            source,
        })?;
        write_replacing(&dir.join(&body_file), &body).await?;
        write_replacing(&meta_path, &meta).await?;

        if let Some(old) = previous.filter(|old| *old != body_file && is_plain_name(old)) {
            if let Err(e) = fs::remove_file(dir.join(&old)).await {
                debug!(file = %old, error = %e, "Could not remove replaced cache body");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Response;

    fn storage() -> (tempfile::TempDir, DiskStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        (dir, storage)
    }

    fn entry(url: &str, body: &str) -> StoredResponse {
        StoredResponse::from_response(Response::new(url, 200, body))
    }

    fn bucket_files(storage: &DiskStorage, bucket: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(storage.bucket_dir(bucket).unwrap())
            .unwrap()
            .map(|item| item.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_put_and_lookup_survive_reopen() {
        let (dir, storage) = storage();
        let body = vec![0x89, b'P', b'N', b'G', 0, 255];
        let mut response = Response::new("http://x/icons/icon-192x192.png", 200, body.clone());
        response.headers.push(("content-type".to_string(), "image/png".to_string()));
        storage
            .put("v1", StoredResponse::from_response(response))
            .await
            .unwrap();

        let reopened = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        let hit = reopened
            .lookup("v1", "http://x/icons/icon-192x192.png")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.body, body);
        assert_eq!(hit.status, 200);
        assert_eq!(hit.headers, vec![("content-type".to_string(), "image/png".to_string())]);
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let (_dir, storage) = storage();
        assert!(storage.lookup("v1", "http://x/a").await.unwrap().is_none());
        storage.open("v1").await.unwrap();
        assert!(storage.lookup("v1", "http://x/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let (_dir, storage) = storage();
        storage.open("v2").await.unwrap();
        storage.open("v1").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["v1", "v2"]);

        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["v2"]);
    }

    #[tokio::test]
    async fn test_unrelated_directories_are_not_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("other-app");
        std::fs::create_dir_all(&other).unwrap();
        std::fs::write(other.join("data.db"), "keep me").unwrap();

        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        storage.open("v1").await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
        assert!(!storage.delete("other-app").await.unwrap());
        assert_eq!(std::fs::read_to_string(other.join("data.db")).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn test_rejects_path_like_bucket_names() {
        let (_dir, storage) = storage();
        for name in ["", ".", "..", "a/b", "..\\x"] {
            assert!(matches!(
                storage.open(name).await,
                Err(StorageError::InvalidBucket(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_corrupt_metadata_is_reported() {
        let (_dir, storage) = storage();
        storage.open("v1").await.unwrap();
        let meta = storage
            .bucket_dir("v1")
            .unwrap()
            .join(DiskStorage::entry_stem("http://x/a"))
            .with_extension(META_EXTENSION);
        std::fs::write(&meta, "{not json").unwrap();

        assert!(matches!(
            storage.lookup("v1", "http://x/a").await,
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_put_replaces_entry_without_leftovers() {
        let (_dir, storage) = storage();
        storage.put("v1", entry("http://x/a", "old")).await.unwrap();
        storage.put("v1", entry("http://x/a", "new")).await.unwrap();

        let hit = storage.lookup("v1", "http://x/a").await.unwrap().unwrap();
        assert_eq!(hit.body, b"new");

        let stem = DiskStorage::entry_stem("http://x/a");
        let mut expected = vec![
            DiskStorage::body_file(&stem, b"new"),
            format!("{}.{}", stem, META_EXTENSION),
        ];
        expected.sort();
        assert_eq!(bucket_files(&storage, "v1"), expected);
    }

    #[tokio::test]
    async fn test_interrupted_put_keeps_previous_entry() {
        let (_dir, storage) = storage();
        storage.put("v1", entry("http://x/a", "old")).await.unwrap();

        // A put that stopped after the new body landed but before its metadata
        let dir = storage.bucket_dir("v1").unwrap();
        let stem = DiskStorage::entry_stem("http://x/a");
        std::fs::write(dir.join(DiskStorage::body_file(&stem, b"new")), "new").unwrap();
        std::fs::write(
            dir.join(format!("{}.{}{}", stem, META_EXTENSION, TEMP_SUFFIX)),
            "{\"url\":",
        )
        .unwrap();

        let hit = storage.lookup("v1", "http://x/a").await.unwrap().unwrap();
        assert_eq!(hit.body, b"old");

        storage.put("v1", entry("http://x/a", "new")).await.unwrap();
        let hit = storage.lookup("v1", "http://x/a").await.unwrap().unwrap();
        assert_eq!(hit.body, b"new");
    }
}
