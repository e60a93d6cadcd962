//! Capability-specific error types.

/// Result type alias for warden-capability operations.
pub type Result<T> = std::result::Result<T, CapabilityError>;

/// Errors that can occur while issuing or honouring a capability link.
///
/// The `Display` text is for logs. Responses sent to link holders use
/// [`CapabilityError::public_message`] instead.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CapabilityError {
    /// The link's expiry has passed.
    #[error("capability expired at {expires}")]
    Expired {
        /// Expiry the link carried, in Unix seconds.
        expires: i64,
    },

    /// The token does not match the fields it was presented with, or the
    /// fields themselves are malformed.
    #[error("invalid capability: {0}")]
    Invalid(String),

    /// The token is genuine but the resource no longer exists.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// A collaborator failed while serving a genuine link.
    #[error("internal error: {0}")]
    Internal(String),

    /// A configured signing secret is too short.
    #[error("capability secret must be at least {min} bytes, got {len}")]
    WeakSecret {
        /// Length of the offending secret.
        len: usize,
        /// Required minimum.
        min: usize,
    },

    /// Error from warden-core.
    #[error("Core error: {0}")]
    Core(#[from] warden_core::Error),
}

impl CapabilityError {
    /// Whether this error should result in a 4xx (vs. a 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CapabilityError::Expired { .. }
                | CapabilityError::Invalid(_)
                | CapabilityError::ResourceNotFound(_)
        )
    }

    /// HTTP status for this error.
    pub fn status(&self) -> http::StatusCode {
        match self {
            CapabilityError::Expired { .. } | CapabilityError::Invalid(_) => {
                http::StatusCode::FORBIDDEN
            }
            CapabilityError::ResourceNotFound(_) => http::StatusCode::NOT_FOUND,
            CapabilityError::Core(warden_core::Error::NotFound { .. }) => {
                http::StatusCode::NOT_FOUND
            }
            _ => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Generic body text safe to show to an anonymous link holder.
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            http::StatusCode::FORBIDDEN => "This link is invalid or has expired.",
            http::StatusCode::NOT_FOUND => "The shared item could not be found.",
            _ => "Something went wrong. Please try again later.",
        }
    }
}
