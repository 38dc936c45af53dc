//! Diff engine for localization overlays.
//!
//! Computes sparse diffs between an original and an edited JSON document and
//! replays them onto later upstream versions of that document. Arrays of
//! records (objects carrying an `id`) are diffed by identity so that edits
//! survive upstream insertions, removals, and reordering; other arrays are
//! diffed by position.
//!
//! Two contracts are kept apart:
//!
//! - **Editing** one base: [`compute_edit`] rejects any change of shape
//!   (see [`check`]) and any edit its diff would not reproduce.
//! - **Replaying** across base versions: [`apply`] tolerates drift and
//!   reports it as [`PatchWarning`]s instead of failing.
//!
//! # Key Types
//!
//! - [`IdentityIndex`] -- id to element lookup over one array
//! - [`Patched`] / [`PatchWarning`] -- Replay result and drift diagnostics
//! - [`Preview`] / [`PreviewHunk`] / [`PreviewLine`] -- Line-level view of a replay

pub mod apply;
pub mod compute;
pub mod error;
pub mod index;
pub mod preview;
pub mod schema;

#[cfg(test)]
mod properties;

pub use apply::{apply, PatchWarning, Patched};
pub use compute::{compute, compute_edit};
pub use error::{DiffError, DiffResult};
pub use index::{is_record_array, IdentityIndex};
pub use preview::{preview, Preview, PreviewHunk, PreviewLine};
pub use schema::{check, validate};
