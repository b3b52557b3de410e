//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The filename does not follow the `volume page siman:seif title[.ext]`
    /// shape. Rename the file; extracting it again will fail the same way.
    #[display("malformed filename '{filename}': {reason}")]
    MalformedFilename {
        /// The offending filename, verbatim.
        filename: String,
        /// Which part of the shape was violated.
        reason: Reason,
    },
}

/// The part of the filename shape that was violated.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    #[display("expected at least three whitespace-separated tokens")]
    TooFewTokens,
    #[display("reference token does not contain the separator")]
    MissingSeparator,
    #[display("reference token contains the separator more than once")]
    RepeatedSeparator,
    #[display("reference token has an empty siman or seif")]
    EmptyReference,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The filename is either well-formed or it isn't.
        false
    }

    #[track_caller]
    pub(crate) fn malformed(filename: &str, reason: Reason) -> Error {
        exn::Exn::from(Self::MalformedFilename {
            filename: filename.to_string(),
            reason,
        })
    }
}
