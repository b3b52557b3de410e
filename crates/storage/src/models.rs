//! Storage models.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// A file discovered in the media source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFile {
    /// Full display path, used to request a share link.
    pub path: String,
    /// Final path component, used for metadata extraction.
    pub name: String,
}
impl RemoteFile {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into() }
    }

    /// Build from a full path, taking the name from its last component.
    ///
    /// ```
    /// use podfeed_storage::RemoteFile;
    ///
    /// let file = RemoteFile::from_path("/MB/MB3 14a 249:2a Title.mp3");
    /// assert_eq!(file.name, "MB3 14a 249:2a Title.mp3");
    /// ```
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default().to_string();
        Self { path, name }
    }
}

/// Opaque token identifying one exact version of a remote file.
///
/// Obtained together with the content in [`FetchedFile`] and handed back on
/// write; a store rejects the write if the file has moved on since.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);
impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Text content of a remote file and the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path: String,
    pub content: String,
    pub revision: Revision,
}
