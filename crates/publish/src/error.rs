//! Publish Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors from the storage, extract and
//! feed crates are raised into these kinds, so a report shows which step
//! failed on which file as well as the underlying cause.

use derive_more::{Display, Error};

/// A publish error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for publish operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the step of publishing that failed.
///
/// ### Per-file Errors
/// - [`ErrorKind::Extract`]
/// - [`ErrorKind::ShareLink`]
/// - [`ErrorKind::Template`]
///
/// ### Feed Errors
/// - [`ErrorKind::Fetch`]
/// - [`ErrorKind::Splice`]
/// - [`ErrorKind::Write`]
/// - [`ErrorKind::Conflict`]
///
/// ### Batch Errors
/// - [`ErrorKind::Discovery`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Recordings could not be listed.
    #[display("could not discover recordings in {_0}")]
    Discovery(#[error(not(source))] String),
    /// The filename does not follow the naming convention.
    #[display("could not extract metadata from {_0}")]
    Extract(#[error(not(source))] String),
    /// The media source refused to share the recording.
    #[display("could not create share link for {_0}")]
    ShareLink(#[error(not(source))] String),
    /// A feed item template failed to render.
    #[display("could not render feed item")]
    Template,
    /// The feed document could not be read.
    #[display("could not fetch feed {_0}")]
    Fetch(#[error(not(source))] String),
    /// The feed document has no place to put the item.
    #[display("could not insert item into feed")]
    Splice,
    /// The feed store rejected the update for a reason other than a conflict.
    #[display("could not write feed {_0}")]
    Write(#[error(not(source))] String),
    /// Every attempt lost the race against a concurrent writer.
    #[display("feed kept changing underneath us; gave up after {attempts} attempts")]
    Conflict { attempts: u32 },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Conflicts are already retried internally up to the configured limit,
    /// so nothing here is worth retrying blindly.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
