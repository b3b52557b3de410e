use podfeed_extract::Extractor;
use podfeed_feed::ItemTemplate;
use podfeed_storage::error::Result as StorageResult;
use podfeed_storage::{FeedHandle, MediaHandle, MediaSource, RemoteFile};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COMMIT_MESSAGE: &str = "Added new recording to RSS feed";
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// What to do with a file whose name doesn't follow the naming convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Stop the whole batch.
    #[default]
    Abort,
    /// Report the file as skipped and move on to the next one.
    Skip,
}

/// How recordings to publish are found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Exactly one file, at this full path. The media source is not listed.
    File(String),
    /// Every file directly inside this folder, in listing order.
    Folder(String),
}
impl Discovery {
    pub fn location(&self) -> &str {
        match self {
            Self::File(path) | Self::Folder(path) => path,
        }
    }

    pub(crate) async fn discover(&self, media: &dyn MediaSource) -> StorageResult<Vec<RemoteFile>> {
        match self {
            Self::File(path) => Ok(vec![RemoteFile::from_path(path.as_str())]),
            Self::Folder(folder) => media.list(folder).await,
        }
    }
}

/// Everything needed to publish recordings.
pub struct Context {
    pub media: MediaHandle,
    pub feed: FeedHandle,
    pub extractor: Extractor,
    pub template: ItemTemplate,
    /// Path of the feed document inside the feed store.
    pub feed_path: String,
    pub commit_message: String,
    /// Additional fetch/splice/write attempts after a revision conflict.
    pub max_conflict_retries: u32,
    pub on_malformed: MalformedPolicy,
}
impl Context {
    pub fn new(media: MediaHandle, feed: FeedHandle, feed_path: impl Into<String>) -> Self {
        Self {
            media,
            feed,
            extractor: Extractor::default(),
            template: ItemTemplate::default(),
            feed_path: feed_path.into(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            on_malformed: MalformedPolicy::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_template(mut self, template: ItemTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }
}
