//! Backend boundary error types
//!
//! Every backend call can fail, and callers must be able to distinguish
//! "resource not found" (expected, often used as control flow during image
//! resolution) from a transport failure (unexpected, always surfaced to the
//! user) and from a request the backend rejected outright (validation; the
//! backend owns the rules, the message is passed through verbatim).

use thiserror::Error;

/// Errors reported across the backend boundary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// The requested resource does not exist (recoverable, control flow)
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend process could not be reached or the call failed in transit
    #[error("backend transport failure: {0}")]
    Transport(String),

    /// The backend rejected the request (validation or constraint violation)
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

impl RpcError {
    /// Whether this error is the recoverable not-found condition
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
