use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The target environment itself is misconfigured (missing quality
    /// profile or root folder). Fatal for that target's run.
    #[error("Configuration resolution failed: {0}")]
    ConfigResolution(String),

    #[error("Tag could not be resolved: {0}")]
    TagUnresolved(String),

    #[error("Source fetch failed: {0}")]
    SourceFetch(String),
}

impl EngineError {
    /// Whether a failure aborts the whole target run instead of degrading to
    /// a logged, skipped operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::ConfigResolution(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
