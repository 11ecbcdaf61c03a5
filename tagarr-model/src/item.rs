use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ModelError;
use crate::ids::{LocalId, TagId, TmdbId, TvdbId};

/// The kind of library a target manages. Reconcilers only ever see desired
/// items of their own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movies,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movies => "movies",
            MediaKind::Series => "series",
        }
    }
}

impl FromStr for MediaKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movies" | "movie" => Ok(MediaKind::Movies),
            "series" | "tv" | "shows" => Ok(MediaKind::Series),
            other => Err(ModelError::InvalidKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry a watchlist source wants present on a target.
///
/// Produced by a source collector for a single sync pass and immutable for
/// the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DesiredItem {
    pub kind: MediaKind,
    pub title: String,
    pub tmdb_id: Option<TmdbId>,
    pub tvdb_id: Option<TvdbId>,
    pub imdb_id: Option<String>,
    /// Tag names declared for this item (source tags plus any per-item tags).
    pub tags: BTreeSet<String>,
    /// Quality profile name overriding the target default, if any.
    pub quality_override: Option<String>,
    /// Explicit set of season numbers to monitor; overrides the global
    /// monitor strategy when present. Series only.
    pub season_selector: Option<BTreeSet<u16>>,
}

impl DesiredItem {
    pub fn new(kind: MediaKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            tmdb_id: None,
            tvdb_id: None,
            imdb_id: None,
            tags: BTreeSet::new(),
            quality_override: None,
            season_selector: None,
        }
    }

    /// The external identifier a target of the given kind matches on.
    /// `None` means the item cannot be synced to that target at all.
    pub fn primary_id(&self, kind: MediaKind) -> Option<u64> {
        match kind {
            MediaKind::Movies => self.tmdb_id.map(|id| id.as_u64()),
            MediaKind::Series => self.tvdb_id.map(|id| id.as_u64()),
        }
    }

    /// Whether any external identifier resolved for this item.
    pub fn has_external_id(&self) -> bool {
        self.tmdb_id.is_some() || self.tvdb_id.is_some() || self.imdb_id.is_some()
    }
}

/// Monitored flag for one season of a series as known to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SeasonState {
    pub number: u16,
    pub monitored: bool,
}

/// A target's current record for one library entry.
///
/// Read fresh from the target at the start of every run and never cached
/// across runs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManagedItem {
    pub local_id: LocalId,
    pub title: String,
    pub tmdb_id: Option<TmdbId>,
    pub tvdb_id: Option<TvdbId>,
    pub tags: BTreeSet<TagId>,
    pub monitored: bool,
    /// Per-season monitored flags; empty for movie targets.
    pub seasons: Vec<SeasonState>,
}

impl ManagedItem {
    /// The external identifier this record matches desired items on.
    pub fn primary_id(&self, kind: MediaKind) -> Option<u64> {
        match kind {
            MediaKind::Movies => self.tmdb_id.map(|id| id.as_u64()),
            MediaKind::Series => self.tvdb_id.map(|id| id.as_u64()),
        }
    }

    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }
}
