//! The narrow interface every target backend implements, plus the concrete
//! clients for the arr REST dialect.

mod http;
pub mod radarr;
pub mod sonarr;

use std::collections::BTreeSet;

use async_trait::async_trait;
use tagarr_model::{LocalId, ManagedItem, MediaKind, SeasonState, Tag, TagId};

use crate::error::Result;

pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;

/// Creation payload for one library entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub tmdb_id: Option<u64>,
    pub tvdb_id: Option<u64>,
    pub quality_profile_id: i32,
    pub root_folder: String,
    pub tags: BTreeSet<TagId>,
    pub monitored: bool,
    /// Per-season monitored flags; empty for movie targets.
    pub seasons: Vec<SeasonState>,
    pub search_on_add: bool,
}

/// How the target answered a create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The target already tracks this entry. Treated as success by callers.
    AlreadyExists,
}

/// Partial update for one library entry; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub tags: Option<BTreeSet<TagId>>,
    pub monitored: Option<bool>,
    pub seasons: Option<Vec<SeasonState>>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.monitored.is_none() && self.seasons.is_none()
    }
}

/// Options for a delete call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub delete_files: bool,
    pub add_import_exclusion: bool,
}

/// A quality profile as listed by the target.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct QualityProfile {
    pub id: i32,
    pub name: String,
}

/// A root folder as listed by the target.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RootFolder {
    pub path: String,
}

/// One external media-library manager.
///
/// Implementations own the wire format, authentication, and the
/// backend-specific "already exists" error shape; the reconciler never sees
/// raw HTTP.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TargetClient: Send + Sync {
    /// Which library kind this target manages.
    fn kind(&self) -> MediaKind;

    /// Human-readable name for logs.
    fn name(&self) -> String;

    /// Fetch the full current inventory.
    async fn list_items(&self) -> Result<Vec<ManagedItem>>;

    /// Create a library entry. A backend-specific "already exists" response
    /// is reported as [`AddOutcome::AlreadyExists`], never as an error.
    async fn add_item(&self, item: &NewItem) -> Result<AddOutcome>;

    /// Apply a partial update to an existing entry.
    async fn update_item(&self, id: LocalId, update: &ItemUpdate) -> Result<()>;

    /// Remove an entry.
    async fn delete_item(&self, id: LocalId, options: &DeleteOptions) -> Result<()>;

    /// Fetch the full tag list.
    async fn list_tags(&self) -> Result<Vec<Tag<TagId>>>;

    /// Create a tag by name, returning it with its assigned id.
    async fn create_tag(&self, name: &str) -> Result<Tag<TagId>>;

    /// List the target's quality profiles.
    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>>;

    /// List the target's root folders.
    async fn root_folders(&self) -> Result<Vec<RootFolder>>;
}
