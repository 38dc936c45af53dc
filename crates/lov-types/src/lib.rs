//! Foundation types for localization overlays (LOV).
//!
//! An overlay is a set of user edits to JSON localization documents, stored
//! as sparse diffs so they can be replayed onto freshly downloaded upstream
//! versions of the same documents. Every other LOV crate depends on
//! `lov-types`.
//!
//! # Key Types
//!
//! - [`DiffNode`]: Sparse, shape-mirroring diff tree
//! - [`ChangeRecord`] / [`RecordChange`] / [`ChangeAction`]: Identity-anchored edits inside record arrays
//! - [`Slot`]: One index of a positional array diff
//! - [`RecordId`]: Stable identity of a record (`id` field of an array element)
//! - [`DiffDocument`]: Path-keyed map of per-file diffs
//! - [`JsonPath`]: Location inside a document, used in errors and warnings

pub mod codec;
pub mod document;
pub mod error;
pub mod node;
pub mod path;
pub mod record;

pub use codec::{parse_json, to_pretty_json, DEFAULT_INDENT};
pub use document::{normalize_path, DiffDocument};
pub use error::{TypeError, TypeResult};
pub use node::{value_kind, DiffNode, FieldDiffs, Slot};
pub use path::JsonPath;
pub use record::{ChangeAction, ChangeRecord, RecordChange, RecordId};
