//! Blob storage for submitted files.
//!
//! Rows only ever hold the opaque name returned by [`blob_name`]; the
//! student's original filename is kept for display and downloads.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 10;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Durably stores `bytes` under `name`; the blob is complete once this
    /// returns `Ok`.
    async fn put(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
    async fn get(&self, name: &str) -> io::Result<Vec<u8>>;
    /// Removing a missing blob is not an error.
    async fn remove(&self, name: &str) -> io::Result<()>;
}

/// 32 hex characters plus the lower-cased alphanumeric extension of
/// `original_name`, if it has one.
pub fn blob_name(original_name: &str) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(char::is_ascii_alphanumeric)
                .take(MAX_EXTENSION_LEN)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|e| !e.is_empty());

    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

/// Best-effort cleanup after the owning rows are gone; failures are
/// logged and leave an orphaned blob behind.
pub async fn remove_all(store: &dyn BlobStore, names: &[String]) {
    for name in names {
        if let Err(e) = store.remove(name).await {
            warn!(name = %name, "failed to remove blob: {}", e);
        }
    }
}

fn check_name(name: &str) -> io::Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid blob name"));
    }
    Ok(())
}

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub async fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        check_name(name)?;
        let path = self.root.join(name);
        let tmp = self.root.join(format!(".{name}.part"));

        let mut file = fs::File::create(&tmp).await?;
        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }

        fs::rename(&tmp, &path).await?;
        // The rename itself is only durable once the directory entry is.
        #[cfg(unix)]
        fs::File::open(&self.root).await?.sync_all().await?;
        debug!(name, size = bytes.len(), "blob stored");
        Ok(())
    }

    async fn get(&self, name: &str) -> io::Result<Vec<u8>> {
        check_name(name)?;
        fs::read(self.root.join(name)).await
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        check_name(name)?;
        match fs::remove_file(self.root.join(name)).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Process-local store, used by tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        check_name(name)?;
        self.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> io::Result<Vec<u8>> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "blob not found"))
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        self.lock().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_name_keeps_clean_extension() {
        let name = blob_name("Homework 1.PDF");
        let (stem, ext) = name.split_once('.').expect("missing extension");
        assert_eq!(stem.len(), 32);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "pdf");
    }

    #[test]
    fn test_blob_name_without_extension() {
        assert_eq!(blob_name("README").len(), 32);
        assert_eq!(blob_name("../../etc/passwd").len(), 32);
        assert!(!blob_name("evil.p/h$p").contains('/'));
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let root = std::env::temp_dir().join(format!("classroom-blobs-{}", Uuid::new_v4().simple()));
        let store = LocalBlobStore::new(&root).await.unwrap();

        store.put("abc.txt", b"hello").await.unwrap();
        assert_eq!(store.get("abc.txt").await.unwrap(), b"hello");
        assert!(!root.join(".abc.txt.part").exists());

        store.put("abc.txt", b"replaced").await.unwrap();
        assert_eq!(store.get("abc.txt").await.unwrap(), b"replaced");

        store.remove("abc.txt").await.unwrap();
        store.remove("abc.txt").await.unwrap();
        assert!(store.get("abc.txt").await.is_err());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let store = MemoryBlobStore::new();
        let err = store.put("../escape", b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(store.is_empty());
    }
}
