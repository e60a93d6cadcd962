//! Error types for warden-audit

use thiserror::Error;

/// Result type alias for warden-audit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in warden-audit
///
/// None of these reach the code that triggered a mutation; the recorder
/// logs and retries instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from warden-core
    #[error("Core error: {0}")]
    Core(#[from] warden_core::Error),

    /// An audit entry could not be appended.
    #[error("Audit write failed for {target_type} ({action})")]
    WriteFailure {
        /// Entity kind or event target of the lost entry
        target_type: String,
        /// Action of the lost entry
        action: String,
        /// Underlying store error
        #[source]
        source: warden_core::Error,
    },

    /// The audit store rejected a request.
    #[error("Audit store error: {0}")]
    Store(String),
}

impl Error {
    /// Whether retrying the same append may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Core(e) | Error::WriteFailure { source: e, .. } => e.is_retryable(),
            Error::Store(_) => true,
        }
    }
}
