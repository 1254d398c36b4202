use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};

/// Key-value store of opaque binary blobs.
///
/// All implementations must satisfy these invariants:
/// - `save` replaces any previous blob under the same key.
/// - `load` returns exactly the bytes of the last successful `save`.
/// - Missing keys are `Ok(None)` / `Ok(false)`, never errors.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, overwriting any existing blob.
    async fn save(&self, key: &str, data: &[u8]) -> StoreResult<()>;

    /// Read the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing was ever saved under the key.
    async fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Delete the blob under `key`. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;
}

/// Keys must be non-empty and limited to ASCII alphanumerics, `_`, `-`
/// and `.`, and may not start with `.`; file backends map them directly to
/// file names.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
