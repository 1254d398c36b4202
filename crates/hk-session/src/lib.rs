//! Session layer and application context for Hackademy.
//!
//! This is the main entry point for front ends. An [`AppContext`] owns the
//! [`Database`](hk_db::Database), remembers who is logged in across
//! launches through a [`SessionStore`], and sequences the operations that
//! span both stores: saving a module with its questions, deleting a
//! module, and grading quiz attempts.

pub mod attempt;
pub mod config;
pub mod context;
pub mod error;
pub mod kv;
pub mod session;

pub use attempt::{percentage, AttemptOutcome, Answers, QuizAttempt};
pub use config::AppConfig;
pub use context::AppContext;
pub use error::{SessionError, SessionResult};
pub use kv::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
pub use session::{SessionStore, DEFAULT_SESSION_KEY};

// Re-export key types
pub use hk_db::{Database, DbError};
pub use hk_types::{
    Badge, LeaderboardEntry, Module, ModuleDraft, ModuleId, ProgressView, Question,
    QuestionDraft, Role, User, UserId,
};
