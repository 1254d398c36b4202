use thiserror::Error;

/// Errors from parsing identifiers, timestamps, and roles.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}
