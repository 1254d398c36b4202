use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use hk_types::User;

use crate::error::{SessionError, SessionResult};
use crate::kv::KeyValueStore;

/// Key the logged-in user is stored under unless configured otherwise.
pub const DEFAULT_SESSION_KEY: &str = "hackademy_user";

/// Persists the logged-in user between launches.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn save(&self, user: &User) -> SessionResult<()> {
        let json = serde_json::to_string(user)?;
        self.kv.set(&self.key, &json).await?;
        debug!(user_id = %user.id, "session saved");
        Ok(())
    }

    /// Load the stored user.
    ///
    /// An entry that does not parse, or whose `id` is missing or blank, is
    /// removed and reads as logged out.
    ///
    /// A backing store that cannot be parsed at all is reset the same way.
    pub async fn restore(&self) -> SessionResult<Option<User>> {
        let raw = match self.kv.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(SessionError::Serialization(e)) => {
                warn!(key = %self.key, error = %e, "session store unreadable, resetting");
                self.kv.reset().await?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match validate(&raw) {
            Ok(user) => {
                debug!(user_id = %user.id, "session restored");
                Ok(Some(user))
            }
            Err(reason) => {
                warn!(key = %self.key, reason = %reason, "discarding stored session");
                self.kv.remove(&self.key).await?;
                Ok(None)
            }
        }
    }

    pub async fn clear(&self) -> SessionResult<()> {
        self.kv.remove(&self.key).await?;
        debug!("session cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("key", &self.key).finish()
    }
}

fn validate(raw: &str) -> Result<User, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let id_ok = value
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.trim().is_empty());
    if !id_ok {
        return Err("missing or empty id".into());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{FileKeyValueStore, InMemoryKeyValueStore};
    use hk_types::{Role, Timestamp, UserId};

    fn user() -> User {
        User {
            id: UserId::new(),
            username: "alice".into(),
            xp: 120,
            role: Role::User,
            last_login: Timestamp::now(),
        }
    }

    fn store() -> (Arc<InMemoryKeyValueStore>, SessionStore) {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        (kv.clone(), SessionStore::new(kv))
    }

    #[tokio::test]
    async fn save_then_restore() {
        let (_, sessions) = store();
        let u = user();
        sessions.save(&u).await.unwrap();
        assert_eq!(sessions.restore().await.unwrap(), Some(u));
    }

    #[tokio::test]
    async fn nothing_stored_is_logged_out() {
        let (_, sessions) = store();
        assert_eq!(sessions.restore().await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_id_is_discarded() {
        let (kv, sessions) = store();
        kv.set(DEFAULT_SESSION_KEY, r#"{"id":"   ","username":"x"}"#)
            .await
            .unwrap();
        assert_eq!(sessions.restore().await.unwrap(), None);
        assert_eq!(kv.get(DEFAULT_SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn garbage_is_discarded() {
        let (kv, sessions) = store();
        kv.set(DEFAULT_SESSION_KEY, "not json").await.unwrap();
        assert_eq!(sessions.restore().await.unwrap(), None);
        assert_eq!(kv.get(DEFAULT_SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_file_store_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{corrupt").unwrap();
        let kv = Arc::new(FileKeyValueStore::new(&path));
        let sessions = SessionStore::new(kv.clone());

        assert_eq!(sessions.restore().await.unwrap(), None);
        assert_eq!(kv.get(DEFAULT_SESSION_KEY).await.unwrap(), None);

        let u = user();
        sessions.save(&u).await.unwrap();
        assert_eq!(sessions.restore().await.unwrap(), Some(u));
    }

    #[tokio::test]
    async fn non_string_id_is_discarded() {
        let (kv, sessions) = store();
        kv.set(DEFAULT_SESSION_KEY, r#"{"id":42}"#).await.unwrap();
        assert_eq!(sessions.restore().await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_logs_out() {
        let (_, sessions) = store();
        sessions.save(&user()).await.unwrap();
        sessions.clear().await.unwrap();
        assert_eq!(sessions.restore().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stored_form_uses_last_login_field() {
        let (kv, sessions) = store();
        sessions.save(&user()).await.unwrap();
        let raw = kv.get(DEFAULT_SESSION_KEY).await.unwrap().unwrap();
        assert!(raw.contains("\"lastLogin\""));
        assert!(raw.contains("\"role\":\"user\""));
    }
}
