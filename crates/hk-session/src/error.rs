use thiserror::Error;

use hk_types::ModuleId;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("database error: {0}")]
    Database(#[from] hk_db::DbError),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("forbidden: {0} requires an administrator")]
    Forbidden(&'static str),

    #[error("module not found: {0}")]
    ModuleNotFound(ModuleId),

    #[error("module {0} has no questions")]
    NoQuestions(ModuleId),

    #[error("invalid module: {0}")]
    InvalidModule(String),

    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("expected {expected} answers, got {actual}")]
    AnswerCount { expected: usize, actual: usize },

    #[error("operation failed: {0}")]
    OperationFailed(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
