//! Guard rails applied after loading, before the engine sees the config.

use std::collections::HashSet;

use tagarr_model::MediaKind;
use url::Url;

use crate::error::ConfigLoadError;
use crate::models::{Config, TargetConfig};

/// Non-fatal findings surfaced to the operator at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// An untagged source cannot be isolated by the safety lock; its
    /// failure disables cleanup for the whole target.
    UntaggedSource { source: String },
    /// Dry-run is on; nothing will be mutated.
    DryRunEnabled,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::UntaggedSource { source } => write!(
                f,
                "source '{source}' declares no tags; if it fails, cleanup is disabled for its whole target"
            ),
            ConfigWarning::DryRunEnabled => write!(f, "dry-run is enabled; no changes will be made"),
        }
    }
}

fn check_target(name: &str, target: &TargetConfig) -> Result<(), ConfigLoadError> {
    if target.api_key.trim().is_empty() {
        return Err(ConfigLoadError::MissingApiKey(
            name.to_string(),
            name.to_uppercase(),
        ));
    }
    Url::parse(&target.base_url).map_err(|source| ConfigLoadError::InvalidBaseUrl {
        target: name.to_string(),
        source,
    })?;
    Ok(())
}

/// Validate a loaded config, returning startup warnings.
pub fn validate(config: &Config) -> Result<Vec<ConfigWarning>, ConfigLoadError> {
    if config.targets.is_empty() {
        return Err(ConfigLoadError::NoTargets);
    }
    if config.sources.is_empty() {
        return Err(ConfigLoadError::NoSources);
    }

    if let Some(radarr) = &config.targets.radarr {
        check_target("radarr", radarr)?;
    }
    if let Some(sonarr) = &config.targets.sonarr {
        check_target("sonarr", sonarr)?;
    }

    // Source names key the per-source safety reports; a collision would
    // conflate two lists' fetch outcomes.
    let mut names = HashSet::new();
    for source in &config.sources {
        if !names.insert(source.name.as_str()) {
            return Err(ConfigLoadError::DuplicateSource(source.name.clone()));
        }
    }

    for source in &config.sources {
        Url::parse(&source.url).map_err(|err| ConfigLoadError::InvalidSourceUrl {
            source_name: source.name.clone(),
            source: err,
        })?;
        let needed = match source.kind {
            MediaKind::Movies => config.targets.radarr.is_some(),
            MediaKind::Series => config.targets.sonarr.is_some(),
        };
        if !needed {
            return Err(ConfigLoadError::OrphanSource(
                source.name.clone(),
                source.kind.to_string(),
            ));
        }
    }

    humantime::parse_duration(&config.sync.interval).map_err(|_| {
        ConfigLoadError::InvalidDuration {
            field: "sync.interval",
            value: config.sync.interval.clone(),
        }
    })?;
    humantime::parse_duration(&config.sync.retry_delay).map_err(|_| {
        ConfigLoadError::InvalidDuration {
            field: "sync.retry_delay",
            value: config.sync.retry_delay.clone(),
        }
    })?;

    let mut warnings = Vec::new();
    for source in &config.sources {
        if source.tags.is_empty() {
            warnings.push(ConfigWarning::UntaggedSource {
                source: source.name.clone(),
            });
        }
    }
    if config.sync.dry_run {
        warnings.push(ConfigWarning::DryRunEnabled);
    }

    Ok(warnings)
}
