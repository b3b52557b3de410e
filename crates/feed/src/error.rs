//! Feed Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A feed error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The feed has no closed `<channel>` element to insert items into.
    #[display("feed document has no </channel> closing tag")]
    MissingChannelTag,
    /// The feed could not be parsed before the channel was closed.
    #[display("malformed feed document: {_0}")]
    MalformedFeed(#[error(not(source))] String),
    /// An item template failed to compile or render.
    #[display("invalid item template: {_0}")]
    Template(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Same document, same template, same outcome.
        false
    }
}
