//! High-level API for localization overlays.
//!
//! A [`Workshop`] ties together a directory of pristine upstream documents,
//! a [`DiffStore`](lov_store::DiffStore) holding the user's edits, and the
//! diff engine. It serves two callers:
//!
//! - the **editor**, which opens a document, lets the user change values,
//!   and saves the edit back as a sparse diff ([`Workshop::open_document`],
//!   [`Workshop::save`], [`Workshop::reset`]);
//! - the **launch pipeline**, which replays every stored edit onto freshly
//!   downloaded documents ([`Workshop::patch`], [`Workshop::replay_into`]).

pub mod config;
pub mod error;
pub mod replay;
pub mod workshop;

pub use config::WorkshopConfig;
pub use error::{WorkshopError, WorkshopResult};
pub use replay::{FileWarning, ReplayReport};
pub use workshop::{read_json, write_json, DocumentEntry, EditSession, SaveOutcome, Workshop};
