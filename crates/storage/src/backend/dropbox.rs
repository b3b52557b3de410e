//! Dropbox media source.
//!
//! Uses the Dropbox HTTP API v2 with a bearer access token:
//!
//! - `files/list_folder` (+ `files/list_folder/continue`) for discovery,
//! - `sharing/create_shared_link_with_settings` for public links.
//!
//! Every call is a JSON `POST`; failures are answered with HTTP 409 and an
//! `error_summary` such as `path/not_found/..`.

use crate::backend::{MediaSource, RemoteFileStream, summarize_body};
use crate::error::{ErrorKind, Result};
use crate::models::RemoteFile;
use async_stream::try_stream;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com/2";
const SERVICE: &str = "dropbox";

#[derive(Serialize)]
struct CreateSharedLink<'a> {
    path: &'a str,
    settings: SharedLinkSettings,
}

#[derive(Serialize)]
struct SharedLinkSettings {
    requested_visibility: &'static str,
}

#[derive(Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Serialize)]
struct ListFolder<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct ListFolderContinue<'a> {
    cursor: &'a str,
}

#[derive(Deserialize)]
struct ListFolderPage {
    entries: Vec<Entry>,
    cursor: String,
    has_more: bool,
}

#[derive(Deserialize)]
struct Entry {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    path_display: Option<String>,
}
impl Entry {
    fn into_remote_file(self) -> Option<RemoteFile> {
        if self.tag != "file" {
            return None;
        }
        let path = self.path_display?;
        Some(RemoteFile::new(path, self.name))
    }
}

#[derive(Deserialize)]
struct ApiError {
    error_summary: String,
}

/// Dropbox-backed [`MediaSource`].
///
/// # Examples
///
/// ```no_run
/// use podfeed_storage::MediaSource;
/// use podfeed_storage::backend::DropboxBackend;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let dropbox = DropboxBackend::new("dropbox", "sl.access-token")?;
/// let link = dropbox.resolve_link("/MB/MB3 14a 249:2a Title.mp3").await?;
/// # Ok(())
/// # }
/// ```
pub struct DropboxBackend {
    name: String,
    client: Client,
    token: String,
    api_url: String,
}
impl DropboxBackend {
    /// Create a backend with its own HTTP client.
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Configuration("could not build HTTP client".to_string()))?;
        Ok(Self::with_client(client, name, token))
    }

    /// Create a backend sharing an existing HTTP client.
    pub fn with_client(client: Client, name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client,
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the backend at a different API root (proxies, test servers).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint)
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(&self, endpoint: &str, subject: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(self.url(endpoint))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("{SERVICE} {endpoint}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            exn::bail!(classify(status, subject, &body));
        }
        response.json::<T>().await.or_raise(|| ErrorKind::Decode(format!("{SERVICE} {endpoint}")))
    }

    async fn fetch_page(&self, folder: &str, request: PageRequest) -> Result<ListFolderPage> {
        match request {
            PageRequest::Start => {
                let body = ListFolder { path: folder, recursive: false };
                self.call("files/list_folder", folder, &body).await
            },
            PageRequest::Continue(cursor) => {
                let body = ListFolderContinue { cursor: &cursor };
                self.call("files/list_folder/continue", folder, &body).await
            },
        }
    }
}

/// Dropbox paths have no trailing slash, and the root folder is the empty string.
fn normalize_folder(folder: &str) -> &str {
    folder.trim_end_matches('/')
}

/// Which page of a folder listing to request next.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageRequest {
    Start,
    Continue(String),
}

/// Follows `has_more`/`cursor` through every page of a listing, yielding
/// files (not folders or deleted entries) in the order they arrive.
fn paginate<'a, F, Fut>(folder: &'a str, mut fetch_page: F) -> RemoteFileStream<'a>
where
    F: FnMut(PageRequest) -> Fut + Send + 'a,
    Fut: Future<Output = Result<ListFolderPage>> + Send + 'a,
{
    Box::pin(try_stream! {
        let mut page = fetch_page(PageRequest::Start).await?;
        loop {
            let ListFolderPage { entries, cursor, has_more } = page;
            tracing::debug!(folder, entries = entries.len(), has_more, "Listed folder page");
            for file in entries.into_iter().filter_map(Entry::into_remote_file) {
                yield file;
            }
            if !has_more {
                break;
            }
            page = fetch_page(PageRequest::Continue(cursor)).await?;
        }
    })
}

fn classify(status: StatusCode, subject: &str, body: &str) -> ErrorKind {
    let summary = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error_summary)
        .unwrap_or_else(|_| summarize_body(body));
    match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized(format!("{SERVICE}: {summary}")),
        StatusCode::CONFLICT if summary.contains("not_found") => ErrorKind::NotFound(subject.to_string()),
        _ => ErrorKind::Upstream {
            service: SERVICE,
            status: status.as_u16(),
            message: format!("{subject}: {summary}"),
        },
    }
}

#[async_trait]
impl MediaSource for DropboxBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, folder: &'a str) -> RemoteFileStream<'a> {
        let folder = normalize_folder(folder);
        paginate(folder, move |request| self.fetch_page(folder, request))
    }

    #[instrument(skip(self), fields(backend = %self.name))]
    async fn resolve_link(&self, path: &str) -> Result<String> {
        let request = CreateSharedLink {
            path,
            settings: SharedLinkSettings { requested_visibility: "public" },
        };
        let link: SharedLink = self.call("sharing/create_shared_link_with_settings", path, &request).await?;
        tracing::debug!(url = %link.url, "Created shared link");
        Ok(link.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use rstest::rstest;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn page(json: &str) -> ListFolderPage {
        serde_json::from_str(json).unwrap()
    }

    /// Serves `pages` in order and records every request made.
    fn serve(
        pages: Vec<ListFolderPage>,
    ) -> (Arc<Mutex<Vec<PageRequest>>>, impl FnMut(PageRequest) -> futures::future::Ready<Result<ListFolderPage>> + Send)
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let mut pages = VecDeque::from(pages);
        let fetch = move |request: PageRequest| {
            seen.lock().unwrap().push(request);
            futures::future::ready(
                pages.pop_front().ok_or_else(|| exn::Exn::from(ErrorKind::Network("no more pages".to_string()))),
            )
        };
        (requests, fetch)
    }

    #[rstest]
    #[case("/MB/", "/MB")]
    #[case("/MB", "/MB")]
    #[case("/", "")]
    #[case("", "")]
    fn test_normalize_folder(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_folder(input), expected);
    }

    #[test]
    fn test_shared_link_request_shape() {
        let request = CreateSharedLink {
            path: "/MB/a.mp3",
            settings: SharedLinkSettings { requested_visibility: "public" },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"path": "/MB/a.mp3", "settings": {"requested_visibility": "public"}})
        );
        let request = ListFolder { path: "/MB", recursive: false };
        assert_eq!(serde_json::to_value(&request).unwrap(), serde_json::json!({"path": "/MB", "recursive": false}));
    }

    #[test]
    fn test_list_folder_page_keeps_only_files() {
        let body = r#"{
            "entries": [
                {".tag": "file", "name": "MB3 14a 249:2a Title.mp3", "path_display": "/MB/MB3 14a 249:2a Title.mp3", "id": "id:1"},
                {".tag": "folder", "name": "Archive", "path_display": "/MB/Archive"},
                {".tag": "deleted", "name": "gone.mp3", "path_display": "/MB/gone.mp3"}
            ],
            "cursor": "AAE",
            "has_more": false
        }"#;
        let page: ListFolderPage = serde_json::from_str(body).unwrap();
        assert!(!page.has_more);
        let files: Vec<_> = page.entries.into_iter().filter_map(Entry::into_remote_file).collect();
        assert_eq!(files, vec![RemoteFile::new("/MB/MB3 14a 249:2a Title.mp3", "MB3 14a 249:2a Title.mp3")]);
    }

    #[test]
    fn test_shared_link_response() {
        let link: SharedLink =
            serde_json::from_str(r#"{".tag": "file", "url": "https://www.dropbox.com/s/abc/a.mp3?dl=0", "name": "a.mp3"}"#)
                .unwrap();
        assert_eq!(link.url, "https://www.dropbox.com/s/abc/a.mp3?dl=0");
    }

    #[test]
    fn test_classify_not_found() {
        let body = r#"{"error_summary": "path/not_found/..", "error": {".tag": "path"}}"#;
        assert_eq!(classify(StatusCode::CONFLICT, "/MB/x.mp3", body), ErrorKind::NotFound("/MB/x.mp3".to_string()));
    }

    #[test]
    fn test_classify_already_shared() {
        let body = r#"{"error_summary": "shared_link_already_exists/..", "error": {}}"#;
        assert_eq!(
            classify(StatusCode::CONFLICT, "/MB/x.mp3", body),
            ErrorKind::Upstream {
                service: "dropbox",
                status: 409,
                message: "/MB/x.mp3: shared_link_already_exists/..".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_unauthorized_plain_text() {
        let kind = classify(StatusCode::UNAUTHORIZED, "/MB", "invalid_access_token");
        assert_eq!(kind, ErrorKind::Unauthorized("dropbox: invalid_access_token".to_string()));
    }

    #[tokio::test]
    async fn test_paginate_follows_cursor_across_pages() {
        let pages = vec![
            page(r#"{"entries": [
                {".tag": "file", "name": "a.mp3", "path_display": "/MB/a.mp3"},
                {".tag": "folder", "name": "Archive", "path_display": "/MB/Archive"}
            ], "cursor": "c1", "has_more": true}"#),
            page(r#"{"entries": [
                {".tag": "deleted", "name": "gone.mp3", "path_display": "/MB/gone.mp3"},
                {".tag": "file", "name": "b.mp3", "path_display": "/MB/b.mp3"}
            ], "cursor": "c2", "has_more": true}"#),
            page(r#"{"entries": [
                {".tag": "file", "name": "c.mp3", "path_display": "/MB/c.mp3"}
            ], "cursor": "c3", "has_more": false}"#),
        ];
        let (requests, fetch) = serve(pages);
        let files: Vec<RemoteFile> = paginate("/MB", fetch).try_collect().await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.mp3", "b.mp3", "c.mp3"]);
        // Each continuation uses the cursor of the page before it; nothing after the last page.
        assert_eq!(
            *requests.lock().unwrap(),
            vec![PageRequest::Start, PageRequest::Continue("c1".to_string()), PageRequest::Continue("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_paginate_single_page() {
        let (requests, fetch) = serve(vec![page(r#"{"entries": [], "cursor": "c1", "has_more": false}"#)]);
        let files: Vec<RemoteFile> = paginate("/MB", fetch).try_collect().await.unwrap();
        assert!(files.is_empty());
        assert_eq!(*requests.lock().unwrap(), vec![PageRequest::Start]);
    }

    #[tokio::test]
    async fn test_paginate_error_after_first_page() {
        let first = page(r#"{"entries": [
            {".tag": "file", "name": "a.mp3", "path_display": "/MB/a.mp3"}
        ], "cursor": "c1", "has_more": true}"#);
        let (_requests, fetch) = serve(vec![first]);
        let mut stream = paginate("/MB", fetch);
        assert_eq!(stream.try_next().await.unwrap().map(|f| f.name), Some("a.mp3".to_string()));
        let err = stream.try_next().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Network(_)));
    }
}
