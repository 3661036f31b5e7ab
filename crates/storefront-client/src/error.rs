//! Combined error type for callers driving the whole client

use crate::config::ConfigError;
use storefront_core::{FetchError, SessionError, StorageError};

/// Any failure surfaced by the storefront client
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    /// Remote read failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Session operation rejected or failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Session storage failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded or applied
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StorefrontError {
    /// Check if retrying the operation could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_retryable(),
            Self::Session(_) | Self::Storage(_) | Self::Config(_) => false,
        }
    }
}

/// Result alias for storefront client operations
pub type StorefrontResult<T> = Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{Resource, SessionPhase};

    #[test]
    fn fetch_errors_keep_their_message() {
        let err: StorefrontError = FetchError::status(Resource::Categories, 500).into();

        assert_eq!(err.to_string(), "failed to fetch categories: unexpected status 500");
        assert!(err.is_retryable());
    }

    #[test]
    fn session_errors_are_not_retryable() {
        let err: StorefrontError =
            SessionError::invalid_transition(SessionPhase::SignedIn, SessionPhase::Authenticating)
                .into();

        assert!(!err.is_retryable());
    }
}
