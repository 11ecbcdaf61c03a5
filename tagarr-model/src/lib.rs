//! Core data model definitions shared across tagarr crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod item;
pub mod monitor;
pub mod summary;
pub mod tag;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use ids::{LocalId, TagId, TmdbId, TvdbId};
pub use item::{DesiredItem, ManagedItem, MediaKind, SeasonState};
pub use monitor::MonitorStrategy;
pub use summary::RunSummary;
pub use tag::Tag;
