//! In-memory record store for testing and ephemeral use.
//!
//! [`InMemoryRecordStore`] keeps records in a `HashMap` plus a group index,
//! both protected by a single `RwLock`.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{QuizError, Result};
use crate::traits::{Record, RecordStore};

pub(crate) struct State<R: Record> {
    records: HashMap<R::Key, R>,
    groups: HashMap<R::Group, HashSet<R::Key>>,
}

impl<R: Record> Clone for State<R> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            groups: self.groups.clone(),
        }
    }
}

impl<R: Record> Default for State<R> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            groups: HashMap::new(),
        }
    }
}

impl<R: Record> State<R> {
    pub(crate) fn records(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    pub(crate) fn insert(&mut self, record: R) -> Result<()> {
        let key = record.key();
        if self.records.contains_key(&key) {
            return Err(QuizError::AlreadyExists {
                key: key.to_string(),
            });
        }
        self.groups
            .entry(record.group())
            .or_default()
            .insert(key.clone());
        self.records.insert(key, record);
        Ok(())
    }

    pub(crate) fn remove(&mut self, key: &R::Key) -> Option<R> {
        let record = self.records.remove(key)?;
        let group = record.group();
        if let Some(keys) = self.groups.get_mut(&group) {
            keys.remove(key);
            if keys.is_empty() {
                self.groups.remove(&group);
            }
        }
        Some(record)
    }

    pub(crate) fn remove_group(&mut self, group: &R::Group) -> usize {
        let keys = self.groups.remove(group).unwrap_or_default();
        for key in &keys {
            self.records.remove(key);
        }
        keys.len()
    }

    pub(crate) fn replace_group(&mut self, group: &R::Group, records: Vec<R>) -> Result<()> {
        self.remove_group(group);
        records.into_iter().try_for_each(|r| self.insert(r))
    }
}

/// An in-memory implementation of [`RecordStore`].
///
/// Data is lost when the store is dropped.
pub struct InMemoryRecordStore<R: Record> {
    state: RwLock<State<R>>,
}

impl<R: Record> InMemoryRecordStore<R> {
    /// Create a new empty record store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Build a store pre-populated with `records`.
    pub fn from_records(records: impl IntoIterator<Item = R>) -> Result<Self> {
        let mut state = State::default();
        for record in records {
            state.insert(record)?;
        }
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// A copy of the current contents, for building the next state off-lock.
    pub(crate) fn snapshot(&self) -> Result<State<R>> {
        let state = self
            .state
            .read()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        Ok(state.clone())
    }

    /// Swap in a state produced from [`snapshot`](Self::snapshot).
    pub(crate) fn install(&self, next: State<R>) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        *state = next;
        Ok(())
    }
}

impl<R: Record> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for InMemoryRecordStore<R> {
    async fn insert(&self, record: R) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        state.insert(record)
    }

    async fn get(&self, key: &R::Key) -> Result<Option<R>> {
        let state = self
            .state
            .read()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        Ok(state.records.get(key).cloned())
    }

    async fn delete(&self, key: &R::Key) -> Result<bool> {
        let mut state = self
            .state
            .write()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        Ok(state.remove(key).is_some())
    }

    async fn get_by_group(&self, group: &R::Group) -> Result<Vec<R>> {
        let state = self
            .state
            .read()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        let records = state
            .groups
            .get(group)
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| state.records.get(k).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    async fn delete_group(&self, group: &R::Group) -> Result<usize> {
        let mut state = self
            .state
            .write()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        Ok(state.remove_group(group))
    }

    /// Applies the whole replacement under one write lock; a duplicate key
    /// leaves the group untouched.
    async fn replace_group(&self, group: &R::Group, records: Vec<R>) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        let mut next = state.clone();
        next.replace_group(group, records)?;
        *state = next;
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|e| QuizError::LockPoisoned(e.to_string()))?;
        Ok(state.records.len())
    }
}

impl<R: Record> std::fmt::Debug for InMemoryRecordStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.state.read().map(|s| s.records.len()).unwrap_or(0);
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hk_types::{ModuleId, Question, QuestionDraft};

    fn question(module: ModuleId, order: u32) -> Question {
        QuestionDraft::new(format!("q{order}"), ["a", "b", "c", "d"], 0)
            .into_question(module, order)
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store: InMemoryRecordStore<Question> = InMemoryRecordStore::new();
        let q = question(ModuleId::new(), 1);
        store.insert(q.clone()).await.unwrap();
        assert_eq!(store.get(&q.id).await.unwrap(), Some(q));
    }

    #[tokio::test]
    async fn duplicate_key_rejected() {
        let store: InMemoryRecordStore<Question> = InMemoryRecordStore::new();
        let q = question(ModuleId::new(), 1);
        store.insert(q.clone()).await.unwrap();
        let err = store.insert(q).await.unwrap_err();
        assert!(matches!(err, QuizError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn groups_are_isolated() {
        let store: InMemoryRecordStore<Question> = InMemoryRecordStore::new();
        let m1 = ModuleId::new();
        let m2 = ModuleId::new();
        for i in 1..=3 {
            store.insert(question(m1, i)).await.unwrap();
        }
        store.insert(question(m2, 1)).await.unwrap();

        assert_eq!(store.get_by_group(&m1).await.unwrap().len(), 3);
        assert_eq!(store.get_by_group(&m2).await.unwrap().len(), 1);

        assert_eq!(store.delete_group(&m1).await.unwrap(), 3);
        assert!(store.get_by_group(&m1).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_single_updates_group_index() {
        let store: InMemoryRecordStore<Question> = InMemoryRecordStore::new();
        let m = ModuleId::new();
        let q = question(m, 1);
        store.insert(q.clone()).await.unwrap();
        store.insert(question(m, 2)).await.unwrap();

        assert!(store.delete(&q.id).await.unwrap());
        assert!(!store.delete(&q.id).await.unwrap());
        assert_eq!(store.get_by_group(&m).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replace_group_swaps_contents() {
        let store: InMemoryRecordStore<Question> = InMemoryRecordStore::new();
        let m = ModuleId::new();
        store.insert(question(m, 1)).await.unwrap();
        store.insert(question(m, 2)).await.unwrap();

        let fresh = vec![question(m, 1)];
        store.replace_group(&m, fresh.clone()).await.unwrap();
        assert_eq!(store.get_by_group(&m).await.unwrap(), fresh);
    }

    #[tokio::test]
    async fn failed_replace_leaves_group_intact() {
        let store: InMemoryRecordStore<Question> = InMemoryRecordStore::new();
        let m = ModuleId::new();
        let kept = question(m, 1);
        store.insert(kept.clone()).await.unwrap();

        let dup = question(m, 2);
        let err = store
            .replace_group(&m, vec![dup.clone(), dup])
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::AlreadyExists { .. }));
        assert_eq!(store.get_by_group(&m).await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn unknown_group_is_empty() {
        let store: InMemoryRecordStore<Question> = InMemoryRecordStore::new();
        assert!(store.get_by_group(&ModuleId::new()).await.unwrap().is_empty());
        assert_eq!(store.delete_group(&ModuleId::new()).await.unwrap(), 0);
    }
}
