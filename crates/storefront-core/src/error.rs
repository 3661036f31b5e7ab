//! Error types for the storefront core
//!
//! Provides error handling for:
//! - Remote fetches (catalog service, identity provider)
//! - Durable session storage
//! - Session state machine misuse and sign-in failures
//! - Model invariants checked on received data

use crate::session::SessionPhase;
use crate::types::{ProductId, Resource};
use rust_decimal::Decimal;
use std::fmt;

/// A remote read that did not produce a usable value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to fetch {resource}: {kind}")]
pub struct FetchError {
    /// What was being fetched
    pub resource: Resource,
    /// Why it failed
    pub kind: FetchErrorKind,
}

impl FetchError {
    /// Create fetch error for resource
    #[inline]
    #[must_use]
    pub fn new(resource: Resource, kind: FetchErrorKind) -> Self {
        Self { resource, kind }
    }

    /// Transport-level failure (connect, timeout, reset)
    #[inline]
    pub fn transport(resource: Resource, message: impl Into<String>) -> Self {
        Self::new(resource, FetchErrorKind::Transport(message.into()))
    }

    /// Non-2xx response
    #[inline]
    #[must_use]
    pub fn status(resource: Resource, status: u16) -> Self {
        Self::new(resource, FetchErrorKind::Status(status))
    }

    /// Body could not be decoded
    #[inline]
    pub fn decode(resource: Resource, message: impl Into<String>) -> Self {
        Self::new(resource, FetchErrorKind::Decode(message.into()))
    }

    /// Body decoded but violates a model invariant
    #[inline]
    pub fn invalid(resource: Resource, message: impl Into<String>) -> Self {
        Self::new(resource, FetchErrorKind::Invalid(message.into()))
    }

    /// Check if a retry could plausibly succeed
    ///
    /// Transport failures, request timeouts, throttling and server errors are
    /// retryable; other client errors and bad payloads are not.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            FetchErrorKind::Transport(_) => true,
            FetchErrorKind::Status(code) => code == 408 || code == 429 || (500..=599).contains(&code),
            FetchErrorKind::Decode(_) | FetchErrorKind::Invalid(_) => false,
        }
    }
}

/// Failure classification for [`FetchError`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchErrorKind {
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Service answered with a non-2xx status
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body was not the expected JSON shape
    #[error("malformed body: {0}")]
    Decode(String),

    /// Body violated a model invariant
    #[error("invalid payload: {0}")]
    Invalid(String),
}

/// Storage operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    /// get
    Read,
    /// put
    Write,
    /// delete
    Delete,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Errors from durable session storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Backend IO failed
    #[error("{op} of '{key}' failed: {source}")]
    Io {
        op: StorageOp,
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored record could not be decoded
    #[error("corrupt record under '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Record could not be encoded for writing
    #[error("could not encode record for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Create IO error for key
    pub fn io(op: StorageOp, key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            key: key.into(),
            source,
        }
    }
}

/// Why a sign-in could not complete
#[derive(Debug, thiserror::Error)]
pub enum SignInFailure {
    /// Completion arrived while no sign-in was in progress
    #[error("no sign-in in progress (session is {0})")]
    NotAuthenticating(SessionPhase),

    /// Identity provider profile could not be fetched
    #[error("profile fetch failed: {0}")]
    Profile(#[source] FetchError),

    /// Session could not be persisted
    #[error("could not persist session: {0}")]
    Storage(#[source] StorageError),
}

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transition not in the session state machine
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionPhase,
        to: SessionPhase,
    },

    /// Sign-in did not complete
    #[error("sign-in failed: {0}")]
    SignInFailed(#[from] SignInFailure),
}

impl SessionError {
    /// Create invalid transition error
    #[inline]
    #[must_use]
    pub fn invalid_transition(from: SessionPhase, to: SessionPhase) -> Self {
        Self::InvalidTransition { from, to }
    }

    /// Check if this is a sign-in failure
    #[inline]
    #[must_use]
    pub fn is_sign_in_failure(&self) -> bool {
        matches!(self, Self::SignInFailed(_))
    }
}

/// Received data violating a model invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Price below zero
    #[error("product {id} has negative price {price}")]
    NegativePrice { id: ProductId, price: Decimal },
}
