//! Error types for the fetch pipeline.
//!
//! `TransportError` is what a transport reports about a single call.
//! `FetchError` is the coordinator's classification of it: the only
//! taxonomy the rest of the engine (and the caller) ever sees.

use std::error::Error;
use std::fmt;

/// Generic retryable message surfaced inline for transient failures.
pub const TRANSIENT_MESSAGE: &str = "Could not load products. Please try again.";

/// Error reported by a [`Transport`](crate::Transport) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The call was aborted through its cancellation token.
    Cancelled,
    /// The server rejected the credential (HTTP 401).
    Unauthorized,
    /// Any other non-success HTTP status.
    Status(u16),
    /// Connection, DNS, TLS or timeout failure.
    Network(String),
    /// The response body was not valid JSON.
    Decode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Cancelled => write!(f, "request cancelled"),
            TransportError::Unauthorized => write!(f, "unauthorized"),
            TransportError::Status(code) => write!(f, "unexpected status {}", code),
            TransportError::Network(msg) => write!(f, "network error: {}", msg),
            TransportError::Decode(msg) => write!(f, "invalid response body: {}", msg),
        }
    }
}

impl Error for TransportError {}

impl TransportError {
    /// HTTP-style status code for this error, if it maps to one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Unauthorized => Some(401),
            TransportError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

/// Classified fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Explicit cancellation. Expected and never shown to the user.
    Cancelled,
    /// Unauthenticated or expired session. Forces logout, not retryable.
    Unauthorized,
    /// Network or server failure. Shown inline with a retry action.
    Transient(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Cancelled => write!(f, "fetch cancelled"),
            FetchError::Unauthorized => write!(f, "session is no longer authorized"),
            FetchError::Transient(detail) => write!(f, "transient fetch failure: {}", detail),
        }
    }
}

impl Error for FetchError {}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => FetchError::Cancelled,
            TransportError::Unauthorized | TransportError::Status(401) => FetchError::Unauthorized,
            other => FetchError::Transient(other.to_string()),
        }
    }
}

impl FetchError {
    /// Whether a manual retry of the same query makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }

    /// The message to show inline, if any. Only transient failures have one.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            FetchError::Transient(_) => Some(TRANSIENT_MESSAGE),
            _ => None,
        }
    }
}

/// Error raised while building a [`CatalogConfig`](crate::CatalogConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    InvalidValue { key: String, value: String },
    /// A value parsed but is outside its allowed range.
    OutOfRange { key: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value for {}: {:?}", key, value)
            }
            ConfigError::OutOfRange { key, reason } => write!(f, "{} out of range: {}", key, reason),
        }
    }
}

impl Error for ConfigError {}

/// The engine refused an operation because no session token is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRequired;

impl fmt::Display for SessionRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a session token is required")
    }
}

impl Error for SessionRequired {}
