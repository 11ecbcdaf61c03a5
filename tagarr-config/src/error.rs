use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("target '{0}' has no API key (set it in the config or via TAGARR_{1}_API_KEY)")]
    MissingApiKey(String, String),

    #[error("target '{target}' has an invalid base URL: {source}")]
    InvalidBaseUrl {
        target: String,
        source: url::ParseError,
    },

    #[error("source '{source_name}' has an invalid URL: {source}")]
    InvalidSourceUrl {
        source_name: String,
        source: url::ParseError,
    },

    #[error("no targets configured; at least one of [targets.radarr] or [targets.sonarr] is required")]
    NoTargets,

    #[error("no sources configured; at least one [[sources]] entry is required")]
    NoSources,

    #[error("source '{0}' feeds kind '{1}' but no target of that kind is configured")]
    OrphanSource(String, String),

    #[error("duplicate source name '{0}'; source names must be unique")]
    DuplicateSource(String),

    #[error("invalid duration for {field}: {value}")]
    InvalidDuration { field: &'static str, value: String },
}
