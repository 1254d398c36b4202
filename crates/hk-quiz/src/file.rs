//! Filesystem-backed record store.
//!
//! A container is one JSON document (`<root>/<container>.json`) holding every
//! record. It is read lazily on first access and cached. A mutation is
//! applied to a copy of the cache, the copy is written through a temp file
//! and a rename, and only then does the copy replace the cache.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::error::{QuizError, Result};
use crate::memory::{InMemoryRecordStore, State};
use crate::traits::{Record, RecordStore};

/// A [`RecordStore`] persisted as a JSON document on disk.
pub struct FileRecordStore<R: Record> {
    path: PathBuf,
    cache: OnceCell<InMemoryRecordStore<R>>,
    write_lock: Mutex<()>,
}

impl<R: Record> FileRecordStore<R> {
    /// Open the container `name` under `root`. Nothing touches the disk
    /// until the first operation.
    pub fn open(root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
        if !valid {
            return Err(QuizError::InvalidContainer(name.to_string()));
        }
        Ok(Self {
            path: root.as_ref().join(format!("{name}.json")),
            cache: OnceCell::new(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn cache(&self) -> Result<&InMemoryRecordStore<R>> {
        self.cache
            .get_or_try_init(|| async {
                let records: Vec<R> = match fs::read(&self.path).await {
                    Ok(bytes) => serde_json::from_slice(&bytes)
                        .map_err(|e| QuizError::Serialization(e.to_string()))?,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
                    Err(e) => return Err(e.into()),
                };
                debug!(
                    path = %self.path.display(),
                    records = records.len(),
                    "record container loaded"
                );
                InMemoryRecordStore::from_records(records)
            })
            .await
    }

    async fn persist(&self, state: &State<R>) -> Result<()> {
        let mut records: Vec<&R> = state.records().collect();
        records.sort_by_key(|r| r.key().to_string());
        let json = serde_json::to_vec_pretty(&records)
            .map_err(|e| QuizError::Serialization(e.to_string()))?;

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

        debug!(
            path = %self.path.display(),
            records = records.len(),
            "record container written"
        );
        Ok(())
    }

    /// Run `op` against a copy of the cache. When `op` reports a change the
    /// copy is written out and then installed; on any error the cache is
    /// left as it was.
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut State<R>) -> Result<(T, bool)> + Send,
    ) -> Result<T>
    where
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let cache = self.cache().await?;
        let mut next = cache.snapshot()?;
        let (value, changed) = op(&mut next)?;
        if changed {
            self.persist(&next).await?;
            cache.install(next)?;
        }
        Ok(value)
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for FileRecordStore<R> {
    async fn insert(&self, record: R) -> Result<()> {
        self.mutate(|state| state.insert(record).map(|()| ((), true)))
            .await
    }

    async fn get(&self, key: &R::Key) -> Result<Option<R>> {
        self.cache().await?.get(key).await
    }

    async fn delete(&self, key: &R::Key) -> Result<bool> {
        self.mutate(|state| {
            let existed = state.remove(key).is_some();
            Ok((existed, existed))
        })
        .await
    }

    async fn get_by_group(&self, group: &R::Group) -> Result<Vec<R>> {
        self.cache().await?.get_by_group(group).await
    }

    async fn delete_group(&self, group: &R::Group) -> Result<usize> {
        self.mutate(|state| {
            let removed = state.remove_group(group);
            Ok((removed, removed > 0))
        })
        .await
    }

    /// Applies the delete and the inserts together and writes the container
    /// once.
    async fn replace_group(&self, group: &R::Group, records: Vec<R>) -> Result<()> {
        self.mutate(|state| state.replace_group(group, records).map(|()| ((), true)))
            .await
    }

    async fn count(&self) -> Result<usize> {
        self.cache().await?.count().await
    }
}

impl<R: Record> std::fmt::Debug for FileRecordStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRecordStore")
            .field("path", &self.path)
            .field("loaded", &self.cache.initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hk_types::{ModuleId, Question, QuestionDraft};

    fn question(module: ModuleId, order: u32) -> Question {
        QuestionDraft::new(format!("q{order}"), ["a", "b", "c", "d"], 1)
            .into_question(module, order)
    }

    fn open(root: &Path) -> FileRecordStore<Question> {
        FileRecordStore::open(root, "quizzes").unwrap()
    }

    #[tokio::test]
    async fn container_created_on_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(!store.path().exists());

        store.insert(question(ModuleId::new(), 1)).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let m = ModuleId::new();
        {
            let store = open(dir.path());
            store
                .replace_group(&m, vec![question(m, 1), question(m, 2)])
                .await
                .unwrap();
        }

        let reopened = open(dir.path());
        let mut loaded = reopened.get_by_group(&m).await.unwrap();
        loaded.sort_by_key(|q| q.order);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].question, "q1");
        assert_eq!(loaded[1].correct_answer, 1);
    }

    #[tokio::test]
    async fn document_uses_record_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.insert(question(ModuleId::new(), 1)).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"moduleId\""));
        assert!(raw.contains("\"correctAnswer\""));
    }

    #[tokio::test]
    async fn delete_group_persists() {
        let dir = tempfile::tempdir().unwrap();
        let m = ModuleId::new();
        let store = open(dir.path());
        store.insert(question(m, 1)).await.unwrap();
        assert_eq!(store.delete_group(&m).await.unwrap(), 1);

        let reopened = open(dir.path());
        assert_eq!(reopened.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_write_keeps_cache_in_step_with_disk() {
        let dir = tempfile::tempdir().unwrap();
        let m = ModuleId::new();
        let store = open(dir.path());
        let original = vec![question(m, 1), question(m, 2), question(m, 3)];
        store.replace_group(&m, original).await.unwrap();

        // A directory where the temp file belongs makes the next write fail.
        std::fs::create_dir(dir.path().join("quizzes.json.tmp")).unwrap();
        assert!(store.replace_group(&m, vec![question(m, 1)]).await.is_err());
        assert!(store.delete_group(&m).await.is_err());

        assert_eq!(store.get_by_group(&m).await.unwrap().len(), 3);
        assert_eq!(open(dir.path()).get_by_group(&m).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn corrupt_container_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("quizzes.json"), b"{not json").unwrap();
        let store = open(dir.path());
        assert!(matches!(
            store.count().await,
            Err(QuizError::Serialization(_))
        ));
    }

    #[test]
    fn invalid_container_name() {
        let res: Result<FileRecordStore<Question>> = FileRecordStore::open("/tmp", "../x");
        assert!(matches!(res, Err(QuizError::InvalidContainer(_))));
    }
}
