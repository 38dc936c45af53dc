//! Diff storage for localization overlays.
//!
//! A store holds one [`DiffDocument`](lov_types::DiffDocument): the stored
//! edits of every document, keyed by relative path. Stores are injected into
//! their callers; there is no process-wide instance.
//!
//! # Concurrency
//!
//! Documents are copy-on-write. [`DiffStore::snapshot`] hands out an
//! `Arc<DiffDocument>` that never changes underneath its reader, and every
//! write replaces a whole path entry by swapping in a new document.
//!
//! # Modules
//!
//! - [`error`]: Error types for store operations
//! - [`traits`]: The [`DiffStore`] trait defining the storage interface
//! - [`memory`]: In-memory [`InMemoryDiffStore`] for tests and previews
//! - [`file`]: JSON-file backed [`FileDiffStore`]

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::{atomic_write, FileDiffStore};
pub use memory::InMemoryDiffStore;
pub use traits::DiffStore;
