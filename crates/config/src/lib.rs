//! Configuration for podfeed.
//!
//! Settings are layered with [figment]: built-in defaults, then an optional
//! configuration file (TOML, YAML or JSON, chosen by extension), then
//! `PODFEED_`-prefixed environment variables with `__` separating nested keys
//! (`PODFEED_GITHUB__REPOSITORY=owner/name`).
//!
//! Access tokens are never read from files; see [`Credentials`].

mod credentials;
pub mod error;
mod settings;

pub use crate::credentials::{Credentials, DROPBOX_TOKEN_VAR, GITHUB_TOKEN_VAR, Secret};
pub use crate::settings::{
    Config, DropboxConfig, ENV_PREFIX, ExtractConfig, FeedConfig, GithubConfig, PublishConfig, default_config_path,
};
