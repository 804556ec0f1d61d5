//! Error types shared across fixwidth crates

use thiserror::Error;

/// Result type alias for fixwidth operations
pub type Result<T> = std::result::Result<T, FixwidthError>;

/// Errors that are not specific to a single ingestion job
#[derive(Error, Debug)]
pub enum FixwidthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

impl FixwidthError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an error for an unparseable setting
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
