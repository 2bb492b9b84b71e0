//! Error types for platform-rs

use thiserror::Error;

/// Errors that can occur when interacting with the platform API
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Configuration file not found
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    /// Failed to parse configuration
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    ConfigInvalid(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No home directory found
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    /// Request could not be sent or the response could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PlatformError {
    /// Message suitable for an error banner.
    ///
    /// API errors carry the server's own message; everything else falls back
    /// to the error's display text.
    pub fn user_message(&self) -> String {
        match self {
            PlatformError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result alias used across the SDK
pub type Result<T> = std::result::Result<T, PlatformError>;
