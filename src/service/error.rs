//! Lookup service error taxonomy.

use std::fmt;

use thiserror::Error;

use crate::repository::StoreError;

/// The write operation a caller attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Mutation::Create => "create",
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Errors returned by [`LookupService`](super::LookupService).
///
/// `Connection` and `Upstream` carry no detail: the underlying store error
/// is logged where it happens and never handed to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The identifier or serial number is malformed.
    #[error("{0}")]
    Validation(String),
    /// The identifier is well formed but nothing matches it.
    #[error("Serial number not found")]
    NotFound,
    /// A write was attempted against the read-only table.
    #[error("Camera ranges are read-only: {0} is not allowed")]
    MethodNotAllowed(Mutation),
    /// The backend could not be reached.
    #[error("Connection error")]
    Connection,
    /// The backend was reached but the query failed or timed out.
    #[error("Upstream error")]
    Upstream,
}

impl LookupError {
    /// Error name as it appears in the API error body.
    pub fn name(&self) -> &'static str {
        match self {
            LookupError::Validation(_) => "ValidationError",
            LookupError::NotFound => "NotFoundError",
            LookupError::MethodNotAllowed(_) => "MethodNotAllowedError",
            LookupError::Connection => "ConnectionError",
            LookupError::Upstream => "UpstreamError",
        }
    }

    /// Whether this is a backend fault rather than a caller mistake.
    pub fn is_fault(&self) -> bool {
        matches!(self, LookupError::Connection | LookupError::Upstream)
    }
}

impl From<&StoreError> for LookupError {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::Connection(_) => LookupError::Connection,
            StoreError::Query(_) => LookupError::Upstream,
        }
    }
}
