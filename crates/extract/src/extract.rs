//! Filename parsing.

use tracing::instrument;

use crate::consts::{DEFAULT_EXTENSIONS, DEFAULT_SEPARATOR};
use crate::error::{ErrorKind, Reason, Result};
use crate::models::Metadata;

/// Parses recording filenames of the shape `volume page siman:seif title[.ext]`.
///
/// The separator and the list of extensions stripped from the end of the title
/// are configurable; see [`with_separator`](Self::with_separator) and
/// [`with_extensions`](Self::with_extensions).
///
/// ```
/// use podfeed_extract::Extractor;
///
/// let keep_extension = Extractor::default().with_extensions::<&str>([]);
/// let metadata = keep_extension.extract("MB3 14a 249:2a Erev Shabbos.mp3").unwrap();
/// assert_eq!(metadata.title, "Erev Shabbos.mp3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    separator: char,
    extensions: Vec<String>,
}
impl Default for Extractor {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}
impl Extractor {
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Replace the extensions stripped from the end of the title. An empty
    /// list disables stripping entirely.
    pub fn with_extensions<S: Into<String>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).filter(|ext: &String| !ext.is_empty()).collect();
        self
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Splits `filename` into [`Metadata`].
    ///
    /// # Errors
    ///
    /// Returns [`MalformedFilename`](ErrorKind::MalformedFilename) if:
    /// - there are fewer than three whitespace-separated tokens,
    /// - the third token does not contain the separator exactly once, or
    /// - either side of the separator is empty.
    #[instrument(level = "trace", skip(self))]
    pub fn extract(&self, filename: &str) -> Result<Metadata> {
        let tokens: Vec<&str> = filename.split_whitespace().collect();
        let [volume, page, reference, rest @ ..] = tokens.as_slice() else {
            return Err(ErrorKind::malformed(filename, Reason::TooFewTokens));
        };
        let (siman, seif) = self.reference(filename, reference)?;
        let title = self.title(&rest.join(" "));
        if title.is_empty() {
            tracing::warn!(filename, "Recording filename has no title words");
        }
        Ok(Metadata {
            volume: volume.to_string(),
            page: page.to_string(),
            siman: siman.to_string(),
            seif: seif.to_string(),
            title,
        })
    }

    /// Splits the reference token into exactly two non-empty parts.
    fn reference<'a>(&self, filename: &str, token: &'a str) -> Result<(&'a str, &'a str)> {
        let mut parts = token.split(self.separator);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_), None, _) => Err(ErrorKind::malformed(filename, Reason::MissingSeparator)),
            (Some(_), Some(_), Some(_)) => Err(ErrorKind::malformed(filename, Reason::RepeatedSeparator)),
            (Some(siman), Some(seif), None) if !siman.is_empty() && !seif.is_empty() => Ok((siman, seif)),
            _ => Err(ErrorKind::malformed(filename, Reason::EmptyReference)),
        }
    }

    /// Removes at most one configured extension from the end of the title.
    fn title(&self, raw: &str) -> String {
        self.extensions
            .iter()
            .find_map(|ext| raw.strip_suffix(ext.as_str()))
            .unwrap_or(raw)
            .trim_end()
            .to_string()
    }
}
