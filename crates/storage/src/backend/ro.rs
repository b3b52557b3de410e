//! Read-only feed store.
//!
//! This module provides a feed store implementation that wraps another
//! implementation and prevents write operations from executing, but
//! indicating success on return.

use async_trait::async_trait;

use crate::{FeedHandle, FeedStore, error::Result, models::FetchedFile, models::Revision};

/// Read-only feed store.
///
/// Wraps another store and silently drops all writes, logging an
/// [`info event`](tracing::Event). The returned revision is the one passed in,
/// since nothing changed remotely.
#[derive(Clone)]
pub struct ReadOnlyFeedStore {
    inner: FeedHandle,
}
impl ReadOnlyFeedStore {
    pub fn new(inner: FeedHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl FeedStore for ReadOnlyFeedStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, path: &str) -> Result<FetchedFile> {
        self.inner.fetch(path).await
    }

    async fn write(&self, path: &str, content: &str, revision: &Revision, message: &str) -> Result<Revision> {
        tracing::info!(path, bytes = content.len(), %revision, message, "Skipping write during read-only mode");
        Ok(revision.clone())
    }
}
