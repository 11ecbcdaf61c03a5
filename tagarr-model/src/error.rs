use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid media kind: {0}")]
    InvalidKind(String),

    #[error("Invalid monitor strategy: {0}")]
    InvalidStrategy(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
