use std::str::FromStr;

use crate::error::ModelError;

/// Global strategy for which units (seasons, or the movie itself) the engine
/// marks as monitored when no explicit per-item selector is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStrategy {
    /// Monitor every regular season.
    All,
    /// Monitor only season 1.
    First,
    /// Monitor only the highest-numbered season.
    Latest,
    /// Monitor seasons still to come; without an airing calendar this
    /// behaves like `Latest`.
    Future,
    /// Monitor nothing.
    None,
}

impl MonitorStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorStrategy::All => "all",
            MonitorStrategy::First => "first",
            MonitorStrategy::Latest => "latest",
            MonitorStrategy::Future => "future",
            MonitorStrategy::None => "none",
        }
    }
}

impl Default for MonitorStrategy {
    fn default() -> Self {
        MonitorStrategy::All
    }
}

impl FromStr for MonitorStrategy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(MonitorStrategy::All),
            "first" => Ok(MonitorStrategy::First),
            "latest" => Ok(MonitorStrategy::Latest),
            "future" => Ok(MonitorStrategy::Future),
            "none" => Ok(MonitorStrategy::None),
            other => Err(ModelError::InvalidStrategy(other.to_string())),
        }
    }
}

impl std::fmt::Display for MonitorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
