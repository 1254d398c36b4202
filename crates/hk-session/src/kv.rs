//! String-keyed string storage for small pieces of client state.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{SessionError, SessionResult};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Create or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> SessionResult<()>;

    /// Returns `true` if the key existed.
    async fn remove(&self, key: &str) -> SessionResult<bool>;

    /// Drop every entry, whatever state the backing storage is in.
    async fn reset(&self) -> SessionResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let entries = self.entries.read().expect("lock poisoned");
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let mut entries = self.entries.write().expect("lock poisoned");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> SessionResult<bool> {
        let mut entries = self.entries.write().expect("lock poisoned");
        Ok(entries.remove(key).is_some())
    }

    async fn reset(&self) -> SessionResult<()> {
        self.entries.write().expect("lock poisoned").clear();
        Ok(())
    }
}

/// A [`KeyValueStore`] kept as one JSON object in a file.
///
/// Every call reads the file; writes rewrite it through a temp file and a
/// rename. A missing file reads as empty.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> SessionResult<BTreeMap<String, String>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(SessionError::Io(e)),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> SessionResult<()> {
        let json = serde_json::to_vec_pretty(entries)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), entries = entries.len(), "key-value file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> SessionResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.write_all(&entries).await?;
        }
        Ok(existed)
    }

    /// Overwrites the file with an empty map without reading it first.
    async fn reset(&self) -> SessionResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_all(&BTreeMap::new()).await
    }
}
