//! Access tokens.

use crate::error::{ErrorKind, Result};
use std::fmt::{Debug, Formatter, Result as FmtResult};

pub const DROPBOX_TOKEN_VAR: &str = "DROPBOX_ACCESS_TOKEN";
pub const GITHUB_TOKEN_VAR: &str = "GH_ACCESS_TOKEN";

/// A credential that never appears in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);
impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}
impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Secret(***)")
    }
}

/// Tokens for the two remote services.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub dropbox: Secret,
    pub github: Secret,
}
impl Credentials {
    /// Read both tokens from the process environment.
    ///
    /// # Errors
    ///
    /// [`MissingCredential`](ErrorKind::MissingCredential) naming the first
    /// variable that is unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read both tokens through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// ```
    /// use podfeed_config::Credentials;
    ///
    /// let credentials = Credentials::from_lookup(|name| Some(format!("{name}-value"))).unwrap();
    /// assert_eq!(credentials.github.expose(), "GH_ACCESS_TOKEN-value");
    /// assert!(Credentials::from_lookup(|_| None).is_err());
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(Secret)
                .ok_or_else(|| exn::Exn::from(ErrorKind::MissingCredential(name)))
        };
        let dropbox = require(DROPBOX_TOKEN_VAR)?;
        let github = require(GITHUB_TOKEN_VAR)?;
        tracing::debug!("Loaded access tokens from environment");
        Ok(Self { dropbox, github })
    }
}
