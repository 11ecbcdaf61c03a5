//! Shared configuration library for tagarr.
//!
//! Centralizes TOML config loading, `.env`/environment overlay for secrets,
//! and validation guard rails so the server binary and tests share a single
//! source of truth for defaults and rules.

pub mod error;
pub mod loader;
pub mod models;
pub mod validation;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader};
pub use models::{
    Config, ServerConfig, SourceListConfig, SyncConfig, TargetConfig, TargetsConfig,
};
pub use validation::{ConfigWarning, validate};
