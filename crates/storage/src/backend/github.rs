//! GitHub feed store.
//!
//! Reads and writes a single file through the repository contents API
//! (`/repos/{owner}/{repo}/contents/{path}`). Content travels base64-encoded
//! in both directions and the blob `sha` serves as the [`Revision`]: GitHub
//! refuses an update whose `sha` no longer matches the file (HTTP 409), which
//! gives us compare-and-swap semantics for free.

use crate::backend::{FeedStore, summarize_body};
use crate::error::{ErrorKind, Result};
use crate::models::{FetchedFile, Revision};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::{OptionExt, ResultExt};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const SERVICE: &str = "github";
const API_VERSION: &str = "2022-11-28";
const ACCEPT_JSON: &str = "application/vnd.github+json";
/// Raw media type; needed for files over 1 MB, which the JSON form omits.
const ACCEPT_RAW: &str = "application/vnd.github.raw+json";

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Deserialize)]
struct UpdateResponse {
    content: UpdatedContent,
}

#[derive(Deserialize)]
struct UpdatedContent {
    sha: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// GitHub-backed [`FeedStore`].
///
/// # Examples
///
/// ```no_run
/// use podfeed_storage::FeedStore;
/// use podfeed_storage::backend::GithubBackend;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let github = GithubBackend::new("github", "ghp_token", "SLKCommand/rss-feed")?;
/// let feed = github.fetch("feed.xml").await?;
/// println!("feed.xml is at {}", feed.revision);
/// # Ok(())
/// # }
/// ```
pub struct GithubBackend {
    name: String,
    client: Client,
    token: String,
    owner: String,
    repository: String,
    branch: Option<String>,
    api_url: String,
}
impl GithubBackend {
    /// Create a backend with its own HTTP client.
    ///
    /// `repository` must be in `owner/name` form.
    pub fn new(name: impl Into<String>, token: impl Into<String>, repository: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Configuration("could not build HTTP client".to_string()))?;
        Self::with_client(client, name, token, repository)
    }

    /// Create a backend sharing an existing HTTP client.
    pub fn with_client(
        client: Client,
        name: impl Into<String>,
        token: impl Into<String>,
        repository: &str,
    ) -> Result<Self> {
        let (owner, repo) = split_repository(repository)
            .ok_or_raise(|| ErrorKind::Configuration(format!("repository must be owner/name: {repository}")))?;
        Ok(Self {
            name: name.into(),
            client,
            token: token.into(),
            owner: owner.to_string(),
            repository: repo.to_string(),
            branch: None,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Read from and commit to `branch` instead of the default branch.
    pub fn with_branch(mut self, branch: impl Into<Option<String>>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Point the backend at a different API root (GitHub Enterprise, proxies).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn contents_url(&self, path: &str) -> Result<Url> {
        contents_url(&self.api_url, &self.owner, &self.repository, path)
    }

    fn request(&self, builder: RequestBuilder, accept: &str) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, builder: RequestBuilder, path: &str, call: &str) -> Result<reqwest::Response> {
        let response = builder.send().await.or_raise(|| ErrorKind::Network(format!("{SERVICE} {call} {path}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            exn::bail!(classify(status, path, &body));
        }
        Ok(response)
    }

    /// Fallback for files too large to be inlined in the JSON response.
    async fn fetch_raw(&self, url: Url, path: &str) -> Result<String> {
        let mut builder = self.request(self.client.get(url), ACCEPT_RAW);
        if let Some(branch) = &self.branch {
            builder = builder.query(&[("ref", branch)]);
        }
        let response = self.send(builder, path, "raw get").await?;
        response.text().await.or_raise(|| ErrorKind::Decode(format!("{SERVICE} raw content of {path}")))
    }
}

fn split_repository(repository: &str) -> Option<(&str, &str)> {
    let (owner, repo) = repository.trim().split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}

/// Builds `{api}/repos/{owner}/{repo}/contents/{path}` with each path segment
/// percent-encoded.
fn contents_url(api_url: &str, owner: &str, repository: &str, path: &str) -> Result<Url> {
    let mut url = Url::parse(api_url).or_raise(|| ErrorKind::Configuration(format!("invalid API URL: {api_url}")))?;
    url.path_segments_mut()
        .map_err(|_| exn::Exn::from(ErrorKind::Configuration(format!("API URL cannot be a base: {api_url}"))))?
        .pop_if_empty()
        .extend(["repos", owner, repository, "contents"])
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// GitHub wraps base64 content at 60 columns.
fn decode_content(encoded: &str, path: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64.decode(compact).or_raise(|| ErrorKind::Decode(format!("base64 content of {path}")))?;
    String::from_utf8(bytes).or_raise(|| ErrorKind::Decode(format!("{path} is not valid UTF-8")))
}

/// Text of a contents response, falling back to `fetch_raw` when the
/// content was not inlined.
async fn resolve_content<F, Fut>(contents: &ContentsResponse, path: &str, fetch_raw: F) -> Result<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    match contents.encoding.as_str() {
        "base64" => decode_content(&contents.content, path),
        // Files over 1 MB come back with an empty body and encoding "none".
        encoding => {
            tracing::debug!(encoding, "Content not inlined; fetching raw");
            fetch_raw().await
        },
    }
}

fn classify(status: StatusCode, path: &str, body: &str) -> ErrorKind {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| summarize_body(body));
    match status {
        StatusCode::NOT_FOUND => ErrorKind::NotFound(path.to_string()),
        StatusCode::CONFLICT => ErrorKind::Conflict(path.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Unauthorized(format!("{SERVICE}: {message}")),
        _ => ErrorKind::Upstream {
            service: SERVICE,
            status: status.as_u16(),
            message: format!("{path}: {message}"),
        },
    }
}

#[async_trait]
impl FeedStore for GithubBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(backend = %self.name))]
    async fn fetch(&self, path: &str) -> Result<FetchedFile> {
        let url = self.contents_url(path)?;
        let mut builder = self.request(self.client.get(url.clone()), ACCEPT_JSON);
        if let Some(branch) = &self.branch {
            builder = builder.query(&[("ref", branch)]);
        }
        let response = self.send(builder, path, "get").await?;
        let contents: ContentsResponse =
            response.json().await.or_raise(|| ErrorKind::Decode(format!("{SERVICE} contents of {path}")))?;
        let content = resolve_content(&contents, path, || self.fetch_raw(url, path)).await?;
        tracing::debug!(revision = %contents.sha, bytes = content.len(), "Fetched file");
        Ok(FetchedFile {
            path: path.to_string(),
            content,
            revision: Revision::new(contents.sha),
        })
    }

    #[instrument(skip(self, content), fields(backend = %self.name, bytes = content.len()))]
    async fn write(&self, path: &str, content: &str, revision: &Revision, message: &str) -> Result<Revision> {
        let url = self.contents_url(path)?;
        let request = UpdateRequest {
            message,
            content: BASE64.encode(content),
            sha: revision.as_str(),
            branch: self.branch.as_deref(),
        };
        let builder = self.request(self.client.put(url), ACCEPT_JSON).json(&request);
        let response = self.send(builder, path, "update").await?;
        let updated: UpdateResponse =
            response.json().await.or_raise(|| ErrorKind::Decode(format!("{SERVICE} update of {path}")))?;
        tracing::debug!(from = %revision, to = %updated.content.sha, "Committed file");
        Ok(Revision::new(updated.content.sha))
    }
}
