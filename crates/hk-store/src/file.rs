//! Filesystem-backed blob store.
//!
//! Each key maps to `<root>/<key>.blob`. Writes go to a sibling temp file
//! that is flushed and then renamed over the target, so a crash mid-save
//! leaves the previous blob intact.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::{validate_key, BlobStore};

const BLOB_EXTENSION: &str = "blob";

/// Blob store keeping one file per key under a root directory.
///
/// The root directory is created on the first `save`, not on construction.
#[derive(Clone, Debug)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{BLOB_EXTENSION}"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{BLOB_EXTENSION}.tmp"))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn save(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        fs::create_dir_all(&self.root).await?;

        let tmp = self.temp_path(key);
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, self.blob_path(key)).await?;
        debug!(key, bytes = data.len(), "blob saved");
        Ok(())
    }

    async fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        match fs::read(self.blob_path(key)).await {
            Ok(data) => {
                debug!(key, bytes = data.len(), "blob loaded");
                Ok(Some(data))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("store");
        let store = FileBlobStore::new(&root);

        assert!(store.load("quiz_data").await.unwrap().is_none());
        assert!(!root.exists());

        store.save("quiz_data", b"image").await.unwrap();
        assert!(root.exists());
    }

    #[tokio::test]
    async fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path());
        let data: Vec<u8> = (0..=255u8).collect();

        store.save("quiz_data", &data).await.unwrap();
        assert_eq!(store.load("quiz_data").await.unwrap().unwrap(), data);
        assert!(dir.path().join("quiz_data.blob").exists());
    }

    #[tokio::test]
    async fn overwrite_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path());

        store.save("quiz_data", b"first").await.unwrap();
        store.save("quiz_data", b"second").await.unwrap();

        assert_eq!(store.load("quiz_data").await.unwrap().unwrap(), b"second");
        assert!(!dir.path().join("quiz_data.blob.tmp").exists());
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileBlobStore::new(dir.path())
            .save("quiz_data", b"persisted")
            .await
            .unwrap();

        let reopened = FileBlobStore::new(dir.path());
        assert_eq!(
            reopened.load("quiz_data").await.unwrap().unwrap(),
            b"persisted"
        );
    }

    #[tokio::test]
    async fn delete_missing_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path());
        assert!(!store.delete("quiz_data").await.unwrap());
        store.save("quiz_data", b"x").await.unwrap();
        assert!(store.delete("quiz_data").await.unwrap());
        assert!(store.load("quiz_data").await.unwrap().is_none());
    }
}
