//! Storage traits and implementations.
//!
//! Two remote collaborators are involved in publishing a recording:
//!
//! - a [`MediaSource`] holds the recordings, lists them and hands out public
//!   share links ([`DropboxBackend`]);
//! - a [`FeedStore`] holds the feed document and supports optimistic
//!   concurrency through [`Revision`] tokens ([`GithubBackend`]).
//!
//! [`ReadOnlyFeedStore`] wraps a feed store for dry runs, and the `mock`
//! feature provides in-memory implementations of both traits for tests.

mod dropbox;
mod github;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

pub use self::dropbox::{DEFAULT_API_URL as DROPBOX_API_URL, DropboxBackend};
pub use self::github::{DEFAULT_API_URL as GITHUB_API_URL, GithubBackend};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockCommit, MockFeedStore, MockMediaSource};
pub use self::ro::ReadOnlyFeedStore;
use crate::error::Result;
use crate::models::{FetchedFile, RemoteFile, Revision};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

pub(crate) type RemoteFileStream<'a> = Pin<Box<dyn Stream<Item = Result<RemoteFile>> + Send + 'a>>;

/// Where recordings live.
///
/// # Examples
///
/// ```
/// use podfeed_storage::{MediaSource, error::Result};
///
/// async fn links_for_folder(source: &dyn MediaSource, folder: &str) -> Result<Vec<String>> {
///     let mut links = Vec::new();
///     for file in source.list(folder).await? {
///         links.push(source.resolve_link(&file.path).await?);
///     }
///     Ok(links)
/// }
/// ```
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// List the files (not sub-folders) directly inside `folder`.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self, folder: &str) -> Result<Vec<RemoteFile>> {
        self.list_stream(folder).try_collect().await
    }

    /// Stream the files directly inside `folder`, yielding them as each page
    /// of results arrives.
    fn list_stream<'a>(&'a self, folder: &'a str) -> RemoteFileStream<'a>;

    /// Create a public share link for the file at `path`.
    ///
    /// Fails if the service rejects the path (not found, already shared,
    /// unauthorized). Never retried.
    async fn resolve_link(&self, path: &str) -> Result<String>;
}

/// Where the feed document lives.
///
/// # Examples
///
/// ```
/// use podfeed_storage::{FeedStore, Revision, error::Result};
///
/// async fn append_comment(store: &dyn FeedStore, path: &str) -> Result<Revision> {
///     let fetched = store.fetch(path).await?;
///     let updated = format!("{}<!-- touched -->", fetched.content);
///     store.write(path, &updated, &fetched.revision, "Touch feed").await
/// }
/// ```
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Read the text content of `path` together with its current revision.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn fetch(&self, path: &str) -> Result<FetchedFile>;

    /// Replace the content of `path`, provided it is still at `revision`.
    ///
    /// This is a compare-and-swap: if the file changed since `revision` was
    /// fetched, nothing is written and
    /// [`Conflict`](crate::error::ErrorKind::Conflict) is returned. On
    /// success, the new revision is returned.
    async fn write(&self, path: &str, content: &str, revision: &Revision, message: &str) -> Result<Revision>;
}

/// Turns a non-success response body into a short human-readable message.
pub(crate) fn summarize_body(body: &str) -> String {
    const MAX_MESSAGE_LENGTH: usize = 200;
    let body = body.trim();
    if body.len() <= MAX_MESSAGE_LENGTH {
        return body.to_string();
    }
    format!("{}…", &body[..body.floor_char_boundary(MAX_MESSAGE_LENGTH)])
}
