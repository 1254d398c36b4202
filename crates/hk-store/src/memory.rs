use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_key, BlobStore};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` and
/// cloned on read/write. The store can be switched to read-only to exercise
/// write-failure paths in callers.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    read_only: AtomicBool,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Reject every subsequent `save` and `delete` with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Overwrite a blob without going through the trait (tests use this to
    /// plant corrupt data).
    pub fn put_raw(&self, key: &str, data: Vec<u8>) {
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), data);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(StoreError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn save(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        self.check_writable()?;
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        self.check_writable()?;
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_before_any_save_is_none() {
        let store = InMemoryBlobStore::new();
        assert!(store.load("quiz_data").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = InMemoryBlobStore::new();
        store.save("quiz_data", b"image-1").await.unwrap();
        assert_eq!(store.load("quiz_data").await.unwrap().unwrap(), b"image-1");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn save_overwrites() {
        let store = InMemoryBlobStore::new();
        store.save("quiz_data", b"old").await.unwrap();
        store.save("quiz_data", b"new").await.unwrap();
        assert_eq!(store.load("quiz_data").await.unwrap().unwrap(), b"new");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_present_and_missing() {
        let store = InMemoryBlobStore::new();
        store.save("k", b"v").await.unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn read_only_rejects_writes_but_allows_reads() {
        let store = InMemoryBlobStore::new();
        store.save("k", b"v").await.unwrap();
        store.set_read_only(true);
        assert!(matches!(
            store.save("k", b"w").await,
            Err(StoreError::ReadOnly)
        ));
        assert_eq!(store.load("k").await.unwrap().unwrap(), b"v");
        store.set_read_only(false);
        store.save("k", b"w").await.unwrap();
    }

    #[tokio::test]
    async fn invalid_key_rejected() {
        let store = InMemoryBlobStore::new();
        assert!(matches!(
            store.save("../x", b"v").await,
            Err(StoreError::InvalidKey(_))
        ));
    }
}
