use hk_types::{ModuleId, UserId};

/// Errors produced by relational store operations.
///
/// Only [`DbError::Initialization`] ever reaches callers of the public
/// [`Database`](crate::Database) API; every other variant is logged and
/// mapped to an empty result at that boundary.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database initialization failed: {0}")]
    Initialization(String),

    #[error("database not initialized; call initialize() first")]
    NotInitialized,

    #[error("unique constraint failed: {table}.{column} = {value}")]
    Constraint {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("check constraint failed: {0}")]
    Check(String),

    #[error("foreign key constraint failed: {0}")]
    ForeignKey(String),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("module not found: {0}")]
    ModuleNotFound(ModuleId),

    #[error("module {0} is deleted")]
    ModuleDeleted(ModuleId),

    #[error("corrupt database image: {0}")]
    CorruptImage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(#[from] hk_store::StoreError),

    #[error("question store error: {0}")]
    Quiz(#[from] hk_quiz::QuizError),
}

pub type DbResult<T> = Result<T, DbError>;
