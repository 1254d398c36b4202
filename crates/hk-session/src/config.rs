use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use hk_db::{DatabaseOptions, DEFAULT_IMAGE_KEY};

use crate::error::{SessionError, SessionResult};
use crate::session::DEFAULT_SESSION_KEY;

pub const DEFAULT_DATA_DIR: &str = ".hackademy";
pub const DEFAULT_QUESTION_CONTAINER: &str = "quizzes";

/// File name of the key-value store holding the session.
const SESSION_FILE: &str = "session.json";

/// Application settings, read from TOML. Every field is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the database image, question records, and session.
    pub data_dir: PathBuf,
    pub image_key: String,
    pub question_container: String,
    pub session_key: String,
    /// Create the sample modules when a new database is built.
    pub seed_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            image_key: DEFAULT_IMAGE_KEY.into(),
            question_container: DEFAULT_QUESTION_CONTAINER.into(),
            session_key: DEFAULT_SESSION_KEY.into(),
            seed_sample_data: true,
        }
    }
}

impl AppConfig {
    /// Read `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml(&content)
                    .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))?;
                debug!(path = %path.display(), "configuration loaded");
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> SessionResult<String> {
        toml::to_string_pretty(self).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    pub fn database_options(&self) -> DatabaseOptions {
        DatabaseOptions {
            image_key: self.image_key.clone(),
            seed_sample_data: self.seed_sample_data,
        }
    }
}
