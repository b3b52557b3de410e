//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// All of these are fatal at startup and are reported before any network
/// call is made.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required credential environment variable is unset or empty
    #[display("missing credential: environment variable {_0} must be set")]
    MissingCredential(#[error(not(source))] &'static str),
    /// A setting is present but unusable
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// Configuration sources could not be read or merged
    #[display("could not load configuration")]
    Load,
}

impl ErrorKind {
    /// Configuration errors never resolve themselves.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
