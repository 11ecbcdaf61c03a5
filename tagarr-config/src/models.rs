//! Configuration tree, deserialized from TOML with per-field defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagarr_model::{MediaKind, MonitorStrategy};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub targets: TargetsConfig,
    pub sources: Vec<SourceListConfig>,
}

/// Health/status endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:4545".to_string(),
        }
    }
}

/// Engine-wide sync behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Time between reconciliation passes, humantime format ("6h", "30m").
    pub interval: String,
    /// Log and skip every mutating call.
    pub dry_run: bool,
    /// Tag marking items as managed by tagarr.
    pub ownership_tag: String,
    /// Additional tags applied to every synced item.
    pub extra_tags: Vec<String>,
    /// Update items that do not carry the ownership tag.
    pub update_untagged: bool,
    pub monitor: MonitorStrategy,
    /// Ask the target to search for newly added items.
    pub search_on_add: bool,
    /// Retry attempts per network call, including the first.
    pub retry_attempts: u32,
    /// Delay between retry attempts, humantime format.
    pub retry_delay: String,
    /// Ceiling for the adaptive concurrency queue.
    pub max_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: "6h".to_string(),
            dry_run: false,
            ownership_tag: "tagarr".to_string(),
            extra_tags: Vec::new(),
            update_untagged: false,
            monitor: MonitorStrategy::default(),
            search_on_add: true,
            retry_attempts: 5,
            retry_delay: "2s".to_string(),
            max_concurrency: 10,
        }
    }
}

impl SyncConfig {
    /// Parsed [`SyncConfig::interval`]; validation guarantees it parses.
    pub fn interval_duration(&self) -> Duration {
        humantime::parse_duration(&self.interval).unwrap_or(Duration::from_secs(6 * 3600))
    }

    /// Parsed [`SyncConfig::retry_delay`]; validation guarantees it parses.
    pub fn retry_delay_duration(&self) -> Duration {
        humantime::parse_duration(&self.retry_delay).unwrap_or(Duration::from_secs(2))
    }
}

/// The configured targets. Absent sections are simply not synced.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetsConfig {
    pub radarr: Option<TargetConfig>,
    pub sonarr: Option<TargetConfig>,
}

impl TargetsConfig {
    pub fn is_empty(&self) -> bool {
        self.radarr.is_none() && self.sonarr.is_none()
    }

    /// Whether a target of the given kind is configured.
    pub fn has_kind(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Movies => self.radarr.is_some(),
            MediaKind::Series => self.sonarr.is_some(),
        }
    }
}

/// Connection and behavior settings for one target instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,
    /// Static API key; usually supplied via TAGARR_<TARGET>_API_KEY.
    pub api_key: String,
    pub quality_profile: String,
    /// Root folder for new items; the target's first listed folder when
    /// unset.
    pub root_folder: Option<String>,
    /// Also delete files on disk when removing an orphaned item.
    pub delete_files: bool,
    /// Add removed items to the target's import exclusion list.
    pub add_import_exclusion: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            quality_profile: "HD-1080p".to_string(),
            root_folder: None,
            delete_files: false,
            add_import_exclusion: true,
        }
    }
}

/// One watchlist source list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceListConfig {
    pub name: String,
    pub kind: MediaKind,
    pub url: String,
    /// Tags declared for every item this list produces. An empty list means
    /// an untagged source: its failure disables cleanup for the whole
    /// target.
    #[serde(default)]
    pub tags: Vec<String>,
}
