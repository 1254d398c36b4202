//! Relational store and progress scoring engine for Hackademy.
//!
//! Users, modules, and per-user progress live in an embedded relational
//! image that is rewritten to a [`BlobStore`](hk_store::BlobStore) after
//! every mutation. Quiz questions live in a separate record store reached
//! through [`QuestionRepository`](hk_quiz::QuestionRepository); the two are
//! never joined transactionally.
//!
//! # Modules
//!
//! - [`error`] -- [`DbError`] and the [`DbResult`] alias
//! - [`schema`] -- tables, indices, and constraint enforcement
//! - [`image`] -- framed, checksummed serialization of the tables
//! - [`scoring`] -- the exactly-once XP award rule
//! - [`leaderboard`] -- leaderboard and progress projections
//! - [`badges`] -- the static badge catalog
//! - [`seed`] -- first-run administrator and sample modules
//! - [`database`] -- the [`Database`] facade
//!
//! # Design Rules
//!
//! 1. XP is only ever added, and only on a first passing completion.
//! 2. Soft-deleted modules are hidden from listings and refuse progress.
//! 3. Only [`Database::initialize`] returns an error to callers.

pub mod badges;
pub mod database;
pub mod error;
pub mod image;
pub mod leaderboard;
pub mod schema;
pub mod scoring;
pub mod seed;

pub use database::{Database, DatabaseOptions, DEFAULT_IMAGE_KEY};
pub use error::{DbError, DbResult};
pub use leaderboard::{ProjectionBuilder, LEADERBOARD_LIMIT};
pub use schema::{TableRows, Tables, UserRow};
pub use scoring::Award;
pub use seed::{ADMIN_PASSWORD, ADMIN_USERNAME};
