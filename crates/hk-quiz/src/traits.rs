//! The [`Record`] and [`RecordStore`] traits defining the grouped record
//! storage interface.
//!
//! Any backend (in-memory, filesystem) implements [`RecordStore`] to hold
//! structured records keyed by a primary key and bulk-managed by a group
//! key, the way question records are managed per module.

use std::fmt::Display;
use std::hash::Hash;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// A structured record with a primary key and a non-unique group key.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Display + Send + Sync;
    type Group: Clone + Eq + Hash + Display + Send + Sync;

    fn key(&self) -> Self::Key;

    fn group(&self) -> Self::Group;
}

/// Storage backend for grouped records.
///
/// Implementations must be thread-safe (`Send + Sync`). Reads by group
/// return records in no particular order; callers sort.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` if the key is taken.
    async fn insert(&self, record: R) -> Result<()>;

    /// Read a record by primary key.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    async fn get(&self, key: &R::Key) -> Result<Option<R>>;

    /// Delete a record by primary key. Returns `true` if it existed.
    async fn delete(&self, key: &R::Key) -> Result<bool>;

    /// All records whose group key equals `group`.
    async fn get_by_group(&self, group: &R::Group) -> Result<Vec<R>>;

    /// Delete every record in `group`, returning how many were removed.
    async fn delete_group(&self, group: &R::Group) -> Result<usize>;

    /// Replace the whole group: delete every existing record in `group`,
    /// then insert `records`.
    ///
    /// The default implementation issues the delete and the inserts as
    /// separate operations; an interruption in between leaves the group
    /// empty. Backends may override to apply the replacement in one write.
    async fn replace_group(&self, group: &R::Group, records: Vec<R>) -> Result<()> {
        self.delete_group(group).await?;
        for record in records {
            self.insert(record).await?;
        }
        Ok(())
    }

    /// Total number of records across all groups.
    async fn count(&self) -> Result<usize>;
}
