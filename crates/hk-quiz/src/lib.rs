//! Grouped record storage and the question repository for Hackademy.
//!
//! Quiz questions are kept outside the relational database image, in a
//! record store indexed by module. This crate provides that store and the
//! repository the rest of the application uses to manage question sets.
//!
//! # Architecture
//!
//! - A [`Record`] has a unique primary key and a non-unique group key.
//! - A [`RecordStore`] holds records and supports bulk replace-by-group.
//! - The [`QuestionRepository`] maps question sets onto a record store,
//!   grouping by module id and numbering questions by position.
//!
//! # Modules
//!
//! - [`error`] -- Error types for record and question operations
//! - [`traits`] -- The [`Record`] and [`RecordStore`] traits
//! - [`memory`] -- In-memory [`InMemoryRecordStore`] for tests
//! - [`file`] -- JSON-document [`FileRecordStore`]
//! - [`repository`] -- The [`QuestionRepository`]

pub mod error;
pub mod file;
pub mod memory;
pub mod repository;
pub mod traits;

pub use error::{QuizError, Result};
pub use file::FileRecordStore;
pub use memory::InMemoryRecordStore;
pub use repository::QuestionRepository;
pub use traits::{Record, RecordStore};
