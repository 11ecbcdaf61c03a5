//! Config loading: `.env`, TOML file, environment overlay, validation.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigLoadError;
use crate::models::Config;
use crate::validation::{ConfigWarning, validate};

/// A validated config plus the warnings produced while loading it.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
}

/// Loads and validates the tagarr config file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, overlay, and validate the config.
    ///
    /// Secrets are overlaid from the environment (after an optional `.env`)
    /// so API keys never need to live in the config file itself.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        if dotenvy::dotenv().is_ok() {
            debug!("loaded .env file");
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigLoadError::Read {
            path: self.path.clone(),
            source,
        })?;
        let mut config: Config = toml::from_str(&raw)?;
        apply_overrides(&mut config, |key| std::env::var(key).ok());

        let warnings = validate(&config)?;
        Ok(ConfigLoad { config, warnings })
    }
}

/// Overlay environment values onto a parsed config. The lookup is injected
/// so tests do not race on process-global environment state.
fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(radarr) = config.targets.radarr.as_mut()
        && let Some(key) = lookup("TAGARR_RADARR_API_KEY")
    {
        radarr.api_key = key;
    }
    if let Some(sonarr) = config.targets.sonarr.as_mut()
        && let Some(key) = lookup("TAGARR_SONARR_API_KEY")
    {
        sonarr.api_key = key;
    }
    if let Some(value) = lookup("TAGARR_DRY_RUN") {
        config.sync.dry_run = matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
}
