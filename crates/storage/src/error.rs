//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// File or folder does not exist
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The file changed since its revision was fetched. Re-fetch, re-apply
    /// the change and write again.
    #[display("revision conflict: {_0} was modified since it was fetched")]
    Conflict(#[error(not(source))] String),
    /// Credentials were rejected or lack the required scope
    #[display("unauthorized: {_0}")]
    Unauthorized(#[error(not(source))] String),
    /// Any other non-success response from the remote service
    #[display("{service} responded with HTTP {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },
    /// The request never got a response (DNS, TLS, connection reset, etc.)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// A response arrived but its body could not be understood
    #[display("could not decode response: {_0}")]
    Decode(#[error(not(source))] String),
    /// Backend could not be constructed from the given settings
    #[display("invalid backend configuration: {_0}")]
    Configuration(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Conflict(_))
    }

    /// Returns `true` if the remote revision moved on underneath the caller.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
