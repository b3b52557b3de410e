//! Publishing recordings into the feed.
//!
//! The primary entry point is [`publish`], which discovers recordings
//! according to a [`Discovery`] strategy and streams a [`PublishEvent`] for
//! each one passed through [`publish_file`]:
//!
//! 1. metadata is extracted from the filename,
//! 2. a public share link is created in the [media source](podfeed_storage::MediaSource),
//! 3. a feed item is rendered from both,
//! 4. the item is spliced into the feed document and committed back to the
//!    [feed store](podfeed_storage::FeedStore), re-fetching and re-splicing
//!    if someone else committed in between.
//!
//! Work is strictly sequential: one file at a time, one remote call at a time.

mod append;
mod context;
pub mod error;
mod file;
mod stream;

pub use crate::append::{Appended, append_item};
pub use crate::context::{Context, DEFAULT_COMMIT_MESSAGE, DEFAULT_MAX_CONFLICT_RETRIES, Discovery, MalformedPolicy};
pub use crate::file::{Published, publish_file};
pub use crate::stream::{PublishEvent, Summary, publish};
