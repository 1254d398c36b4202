//! Error types for record and question operations.

use thiserror::Error;

/// Errors that can occur during record store and question operations.
#[derive(Debug, Error)]
pub enum QuizError {
    /// A record with this primary key already exists.
    #[error("record already exists: {key}")]
    AlreadyExists { key: String },

    /// A question draft failed validation; nothing was written.
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    /// The container name is empty or not usable as a file name.
    #[error("invalid container name: {0:?}")]
    InvalidContainer(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// I/O error during file-based record operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for record and question operations.
pub type Result<T> = std::result::Result<T, QuizError>;
