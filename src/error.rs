//! Error types for zenith.

use thiserror::Error;

/// Errors surfaced by storage, configuration and input parsing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or parse JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse `config.toml`.
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but holds unusable values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// User input rejected at the boundary.
    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
