pub mod backend;
pub mod error;
mod models;

pub use crate::backend::{FeedStore, MediaSource};
pub use crate::models::{FetchedFile, RemoteFile, Revision};
use std::sync::Arc;

pub type MediaHandle = Arc<dyn MediaSource + Send + Sync>;
pub type FeedHandle = Arc<dyn FeedStore + Send + Sync>;

/// Sent with every API request; GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
