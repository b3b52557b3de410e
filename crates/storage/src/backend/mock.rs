//! In-memory storage backends for testing.

use super::RemoteFileStream;
use crate::error::{ErrorKind, Result};
use crate::models::{FetchedFile, RemoteFile, Revision};
use crate::{FeedStore, MediaSource};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};

/// In-memory media source for testing.
///
/// Lists a fixed set of files and hands out deterministic share links
/// (`https://mock.example/s{path}`) unless overridden. Every resolved path is
/// recorded so tests can assert on what was (and was not) requested.
///
/// # Examples
///
/// ```
/// use podfeed_storage::MediaSource;
/// use podfeed_storage::backend::MockMediaSource;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MockMediaSource::with_files(["/MB/MB3 14a 249:2a Title.mp3"]);
/// assert_eq!(source.list("/MB").await?.len(), 1);
/// assert_eq!(
///     source.resolve_link("/MB/MB3 14a 249:2a Title.mp3").await?,
///     "https://mock.example/s/MB/MB3 14a 249:2a Title.mp3",
/// );
/// # Ok(())
/// # }
/// ```
pub struct MockMediaSource {
    name: String,
    files: Vec<RemoteFile>,
    links: HashMap<String, String>,
    failing: HashSet<String>,
    resolved: Mutex<Vec<String>>,
}
impl MockMediaSource {
    /// Create a mock source containing files at the given full paths, listed
    /// in the order given.
    pub fn with_files(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: "mock".to_string(),
            files: paths.into_iter().map(RemoteFile::from_path).collect(),
            links: HashMap::new(),
            failing: HashSet::new(),
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Return `link` instead of the generated one when `path` is resolved.
    pub fn with_link(mut self, path: impl Into<String>, link: impl Into<String>) -> Self {
        self.links.insert(path.into(), link.into());
        self
    }

    /// Make link resolution for `path` fail as if the service rejected it.
    pub fn with_failing_link(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Paths passed to [`resolve_link`](MediaSource::resolve_link) so far, in
    /// call order.
    pub async fn resolved(&self) -> Vec<String> {
        self.resolved.lock().await.clone()
    }
}
impl Default for MockMediaSource {
    fn default() -> Self {
        let files: [&str; 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, folder: &'a str) -> RemoteFileStream<'a> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        Box::pin(stream! {
            for file in &self.files {
                // Direct children only, like the real service.
                if file.path.strip_prefix(&prefix).is_some_and(|rest| !rest.contains('/')) {
                    yield Ok(file.clone());
                }
            }
        })
    }

    async fn resolve_link(&self, path: &str) -> Result<String> {
        self.resolved.lock().await.push(path.to_string());
        if self.failing.contains(path) {
            exn::bail!(ErrorKind::Upstream {
                service: "mock",
                status: 409,
                message: format!("{path}: shared_link_already_exists"),
            });
        }
        if !self.files.iter().any(|f| f.path == path) && !self.links.contains_key(path) {
            exn::bail!(ErrorKind::NotFound(path.to_string()));
        }
        Ok(self.links.get(path).cloned().unwrap_or_else(|| format!("https://mock.example/s{path}")))
    }
}

/// A write accepted by [`MockFeedStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommit {
    pub path: String,
    pub message: String,
    pub revision: Revision,
}

struct StoredFile {
    generation: u64,
    content: String,
}
impl StoredFile {
    fn revision(&self) -> Revision {
        Revision::new(format!("rev-{}", self.generation))
    }
}

/// In-memory feed store for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`]. Revisions are
/// generation counters (`rev-0`, `rev-1`, ...) and writes are checked against
/// them exactly like the real store, so a stale revision yields
/// [`Conflict`](ErrorKind::Conflict).
///
/// # Examples
///
/// ```
/// use podfeed_storage::FeedStore;
/// use podfeed_storage::backend::MockFeedStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockFeedStore::with_file("feed.xml", "<rss/>");
/// let fetched = store.fetch("feed.xml").await?;
/// store.write("feed.xml", "<rss></rss>", &fetched.revision, "Update").await?;
/// // The old revision is now stale.
/// assert!(store.write("feed.xml", "<rss/>", &fetched.revision, "Again").await.is_err());
/// # Ok(())
/// # }
/// ```
pub struct MockFeedStore {
    name: String,
    storage: RwLock<HashMap<String, StoredFile>>,
    pending_conflicts: Mutex<usize>,
    commits: Mutex<Vec<MockCommit>>,
}
impl MockFeedStore {
    /// Create a mock store holding a single file.
    pub fn with_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        let mut store = Self::default();
        store.storage.get_mut().insert(path.into(), StoredFile { generation: 0, content: content.into() });
        store
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make the next `count` writes fail as though another writer committed
    /// first: the stored revision advances (content unchanged) and the write
    /// is rejected with [`Conflict`](ErrorKind::Conflict).
    pub async fn simulate_conflicts(&self, count: usize) {
        *self.pending_conflicts.lock().await = count;
    }

    /// Replace a file out-of-band, advancing its revision, as another writer
    /// would.
    pub async fn replace(&self, path: &str, content: impl Into<String>) {
        let mut guard = self.storage.write().await;
        let generation = guard.get(path).map_or(0, |file| file.generation + 1);
        guard.insert(path.to_string(), StoredFile { generation, content: content.into() });
    }

    /// Current content of `path`, if present.
    pub async fn content(&self, path: &str) -> Option<String> {
        self.storage.read().await.get(path).map(|file| file.content.clone())
    }

    /// Successful writes so far.
    pub async fn commits(&self) -> Vec<MockCommit> {
        self.commits.lock().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.commits.lock().await.len()
    }
}
impl Default for MockFeedStore {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(HashMap::new()),
            pending_conflicts: Mutex::new(0),
            commits: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FeedStore for MockFeedStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, path: &str) -> Result<FetchedFile> {
        let guard = self.storage.read().await;
        let file = guard.get(path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.to_string())))?;
        Ok(FetchedFile {
            path: path.to_string(),
            content: file.content.clone(),
            revision: file.revision(),
        })
    }

    async fn write(&self, path: &str, content: &str, revision: &Revision, message: &str) -> Result<Revision> {
        let mut guard = self.storage.write().await;
        let file = guard.get_mut(path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.to_string())))?;
        {
            let mut pending = self.pending_conflicts.lock().await;
            if *pending > 0 {
                *pending -= 1;
                file.generation += 1;
                exn::bail!(ErrorKind::Conflict(path.to_string()));
            }
        }
        if file.revision() != *revision {
            exn::bail!(ErrorKind::Conflict(path.to_string()));
        }
        file.generation += 1;
        file.content = content.to_string();
        let revision = file.revision();
        self.commits.lock().await.push(MockCommit {
            path: path.to_string(),
            message: message.to_string(),
            revision: revision.clone(),
        });
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_direct_children_in_order() {
        let source = MockMediaSource::with_files([
            "/MB/b.mp3",
            "/MB/a.mp3",
            "/MB/Archive/old.mp3",
            "/Other/c.mp3",
        ]);
        let names: Vec<_> = source.list("/MB/").await.unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["b.mp3", "a.mp3"]);
    }

    #[tokio::test]
    async fn test_resolve_link() {
        let source = MockMediaSource::with_files(["/MB/a.mp3", "/MB/b.mp3"])
            .with_link("/MB/b.mp3", "https://dl.example/b")
            .with_failing_link("/MB/a.mp3");
        assert_eq!(source.resolve_link("/MB/b.mp3").await.unwrap(), "https://dl.example/b");
        let err = source.resolve_link("/MB/a.mp3").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Upstream { .. }));
        let err = source.resolve_link("/MB/missing.mp3").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert_eq!(source.resolved().await, vec!["/MB/b.mp3", "/MB/a.mp3", "/MB/missing.mp3"]);
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let store = MockFeedStore::default();
        let err = store.fetch("feed.xml").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_write_advances_revision() {
        let store = MockFeedStore::with_file("feed.xml", "<rss/>");
        let fetched = store.fetch("feed.xml").await.unwrap();
        assert_eq!(fetched.revision.as_str(), "rev-0");
        let revision = store.write("feed.xml", "<rss></rss>", &fetched.revision, "Update").await.unwrap();
        assert_eq!(revision.as_str(), "rev-1");
        assert_eq!(store.content("feed.xml").await.as_deref(), Some("<rss></rss>"));
        assert_eq!(store.commits().await[0].message, "Update");
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let store = MockFeedStore::with_file("feed.xml", "<rss/>");
        let fetched = store.fetch("feed.xml").await.unwrap();
        store.replace("feed.xml", "<rss>theirs</rss>").await;
        let err = store.write("feed.xml", "<rss>ours</rss>", &fetched.revision, "Update").await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.content("feed.xml").await.as_deref(), Some("<rss>theirs</rss>"));
        assert_eq!(store.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_simulated_conflicts() {
        let store = MockFeedStore::with_file("feed.xml", "<rss/>");
        store.simulate_conflicts(1).await;
        let fetched = store.fetch("feed.xml").await.unwrap();
        let err = store.write("feed.xml", "<rss>1</rss>", &fetched.revision, "Update").await.unwrap_err();
        assert!(err.is_conflict());
        // A fresh fetch picks up the advanced revision and succeeds.
        let fetched = store.fetch("feed.xml").await.unwrap();
        assert_eq!(fetched.content, "<rss/>");
        store.write("feed.xml", "<rss>1</rss>", &fetched.revision, "Update").await.unwrap();
        assert_eq!(store.write_count().await, 1);
    }
}
