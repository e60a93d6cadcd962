//! Error types for warden-acl

use thiserror::Error;
use warden_core::PrincipalId;

/// Result type alias for warden-acl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in warden-acl
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from warden-core (store, not found, config)
    #[error("Core error: {0}")]
    Core(#[from] warden_core::Error),

    /// The source of truth could not be read while resolving a principal.
    #[error("Ability resolution failed for principal {principal}")]
    ResolutionFailure {
        /// Principal being resolved
        principal: PrincipalId,
        /// Underlying store error
        #[source]
        source: warden_core::Error,
    },

    /// A cache call exceeded its time budget.
    #[error("Ability cache call timed out after {millis}ms")]
    CacheTimeout {
        /// Budget in milliseconds
        millis: u64,
    },

    /// The cache backend reported an error.
    #[error("Ability cache error: {0}")]
    Cache(String),
}

impl Error {
    /// Whether this error came from the cache layer, which the resolver
    /// routes around by reading the store directly.
    pub fn is_cache_error(&self) -> bool {
        matches!(self, Error::CacheTimeout { .. } | Error::Cache(_))
    }
}
