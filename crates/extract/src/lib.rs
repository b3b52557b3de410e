mod consts;
pub mod error;
mod extract;
pub mod models;

use tracing::instrument;

pub use crate::consts::{DEFAULT_EXTENSIONS, DEFAULT_SEPARATOR};
use crate::error::Result;
pub use crate::extract::Extractor;
use crate::models::Metadata;

/// Easy, top-level entrypoint for the extraction of [`Metadata`] from a
/// recording's filename.
///
/// Uses the default [`Extractor`]: tokens split on whitespace, references
/// split on [`DEFAULT_SEPARATOR`] and any of the [`DEFAULT_EXTENSIONS`]
/// stripped from the end of the title.
///
/// ```
/// let metadata = podfeed_extract::extract("MB3 14a 249:2a Hilchos Shabbos.mp3").unwrap();
/// assert_eq!(metadata.volume, "MB3");
/// assert_eq!(metadata.seif, "2a");
/// assert_eq!(metadata.title, "Hilchos Shabbos");
/// ```
#[instrument(level = "debug")]
pub fn extract(filename: &str) -> Result<Metadata> {
    Extractor::default().extract(filename)
}
