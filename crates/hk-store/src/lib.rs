//! Named blob storage for Hackademy.
//!
//! The relational store serializes its whole database image into a single
//! opaque blob and hands it to a [`BlobStore`] after every mutation. This
//! crate provides that persistence seam.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileBlobStore`] -- one file per key under a root directory
//!
//! # Design Rules
//!
//! 1. `save` overwrites or creates; there is no versioning.
//! 2. `load` of a key that was never saved is `Ok(None)`, not an error.
//! 3. Backends create their underlying container lazily, so a store can be
//!    used before anything has ever been written.
//! 4. The store never interprets blob contents.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::{validate_key, BlobStore};
