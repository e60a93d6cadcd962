//! Error types for warden-cli

use thiserror::Error;

/// Result type alias for warden-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in warden-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from warden-core
    #[error("Core error: {0}")]
    Core(#[from] warden_core::Error),

    /// Error from warden-capability
    #[error("Capability error: {0}")]
    Capability(#[from] warden_capability::CapabilityError),

    /// Malformed `--base-url`
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Output could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Core(warden_core::Error::config(message))
    }
}
