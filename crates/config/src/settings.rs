//! Layered settings.

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use podfeed_extract::{DEFAULT_EXTENSIONS, DEFAULT_SEPARATOR, Extractor};
use podfeed_feed::{DEFAULT_DESCRIPTION_TEMPLATE, DEFAULT_TITLE_TEMPLATE, ItemTemplate};
use podfeed_publish::{DEFAULT_COMMIT_MESSAGE, DEFAULT_MAX_CONFLICT_RETRIES, MalformedPolicy};
use podfeed_storage::backend::{DROPBOX_API_URL, GITHUB_API_URL};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "PODFEED_";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Where the configuration file is looked for when none is given explicitly:
/// `config.toml` in the platform's config directory for podfeed (for example
/// `~/.config/podfeed/config.toml` on Linux).
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "podfeed").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Complete, validated application settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dropbox: DropboxConfig,
    pub github: GithubConfig,
    pub extract: ExtractConfig,
    pub feed: FeedConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DropboxConfig {
    /// Folder whose files are published in folder mode.
    pub folder: String,
    /// When set, publish exactly this file instead of listing the folder.
    pub file: Option<String>,
    pub api_url: String,
}
impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            folder: "/MB".to_string(),
            file: None,
            api_url: DROPBOX_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// `owner/name`; required.
    pub repository: String,
    pub feed_path: String,
    pub branch: Option<String>,
    pub api_url: String,
    pub commit_message: String,
}
impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            repository: String::new(),
            feed_path: "feed.xml".to_string(),
            branch: None,
            api_url: GITHUB_API_URL.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub separator: char,
    /// Suffixes removed from the title; matched case-sensitively.
    pub strip_extensions: Vec<String>,
}
impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            strip_extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub title_template: String,
    pub description_template: String,
}
impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title_template: DEFAULT_TITLE_TEMPLATE.to_string(),
            description_template: DEFAULT_DESCRIPTION_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Extra fetch/splice/write attempts after a revision conflict.
    pub max_conflict_retries: u32,
    pub on_malformed: MalformedPolicy,
}
impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            on_malformed: MalformedPolicy::default(),
        }
    }
}

impl Config {
    /// Load settings from defaults, a configuration file and the environment.
    ///
    /// An explicit `path` must exist. Without one, [`default_config_path`] is
    /// used if a file is present there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::Invalid(format!("config file not found: {}", path.display())));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(path) = default_config_path()
                    && path.is_file()
                {
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate settings from an already-assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting that can be checked without touching the network.
    ///
    /// Templates are compiled by [`Config::item_template`] instead, so their
    /// syntax is checked when the caller builds them.
    pub fn validate(&self) -> Result<()> {
        self.github_repository()?;
        if self.github.feed_path.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("github.feed_path must not be empty".to_string()));
        }
        if self.github.commit_message.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("github.commit_message must not be empty".to_string()));
        }
        if self.extract.separator.is_whitespace() {
            exn::bail!(ErrorKind::Invalid("extract.separator must not be whitespace".to_string()));
        }
        if self.dropbox.file.as_deref().is_some_and(|file| file.trim().is_empty()) {
            exn::bail!(ErrorKind::Invalid("dropbox.file must not be empty when set".to_string()));
        }
        Ok(())
    }

    /// The `(owner, name)` pair of the feed repository.
    pub fn github_repository(&self) -> Result<(&str, &str)> {
        let repository = self.github.repository.trim();
        if repository.is_empty() {
            exn::bail!(ErrorKind::Invalid("github.repository is required (owner/name)".to_string()));
        }
        match repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => Ok((owner, name)),
            _ => exn::bail!(ErrorKind::Invalid(format!("github.repository must be owner/name, got '{repository}'"))),
        }
    }

    pub fn extractor(&self) -> Extractor {
        Extractor::default()
            .with_separator(self.extract.separator)
            .with_extensions(self.extract.strip_extensions.iter().cloned())
    }

    pub fn item_template(&self) -> Result<ItemTemplate> {
        ItemTemplate::new(&self.feed.title_template, &self.feed.description_template)
            .or_raise(|| ErrorKind::Invalid("feed template syntax".to_string()))
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    let figment = match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::Invalid(format!(
            "unsupported config file format (expected .toml, .yaml or .json): {}",
            path.display()
        ))),
    };
    tracing::debug!(path = %path.display(), "Merged configuration file");
    Ok(figment)
}
