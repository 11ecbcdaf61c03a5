//! The tagarr reconciliation engine.
//!
//! Keeps the tag and monitoring state of external media-library managers
//! ("targets") consistent with the desired item set produced by watchlist
//! sources, without ever deleting an item the current run cannot prove is
//! unwanted. The safety lock ([`safety`]) turns per-source fetch outcomes
//! into deletion constraints; the reconciler ([`reconciler`]) applies the
//! add/update/delete diff per target, gated by tag ownership.

pub mod diff;
pub mod error;
pub mod queue;
pub mod reconciler;
pub mod retry;
pub mod safety;
pub mod sources;
pub mod status;
pub mod tags;
pub mod targets;

pub use diff::{next_labels, next_tags};
pub use error::{EngineError, Result};
pub use queue::{AdaptiveQueue, QueueSettings};
pub use reconciler::{Reconciler, SyncSettings, desired_seasons};
pub use retry::{RetryPolicy, retry};
pub use safety::{FetchOutcome, SafetyVerdict, SourceReport, assess};
pub use sources::{Collection, FetchResult, JsonListSource, SourceCollector, collect};
pub use status::{AppState, AppStatus, StatusSnapshot};
pub use tags::TagResolver;
pub use targets::{
    AddOutcome, DeleteOptions, ItemUpdate, NewItem, QualityProfile, RadarrClient, RootFolder,
    SonarrClient, TargetClient,
};
