//! Common error types for podmix

use thiserror::Error;

/// Common result type for settings operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or validating settings
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML settings file could not be parsed
    #[error("Settings parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON settings document could not be parsed
    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
