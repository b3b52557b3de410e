//! Item templating.
//!
//! Converts recording [`Metadata`] into [`FeedItem`] text using
//! user-configured [upon] templates (`{{ variable }}` syntax).
//!
//! # Template Variables
//!
//! | Variable  | Description                                  |
//! |-----------|----------------------------------------------|
//! | `volume`  | First filename token                         |
//! | `page`    | Second filename token                        |
//! | `siman`   | Reference before the separator               |
//! | `seif`    | Reference after the separator                |
//! | `title`   | Remaining words, extension stripped          |
//! | `link`    | Public share link of the recording           |
//!
//! Rendered values are escaped when the item is written into the feed, so
//! templates should contain plain text rather than markup.
//!
//! # Example
//!
//! ```
//! use podfeed_extract::models::Metadata;
//! use podfeed_feed::ItemTemplate;
//!
//! let metadata = Metadata {
//!     volume: "MB3".into(), page: "14a".into(), siman: "249".into(), seif: "2a".into(),
//!     title: "Erev Shabbos".into(),
//! };
//! let item = ItemTemplate::default().render(&metadata, "https://dl.example/abc").unwrap();
//! assert_eq!(item.description, "Volume: MB3, Page: 14a, Siman: 249, Seif: 2a");
//! ```

use crate::FeedItem;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use podfeed_extract::models::Metadata;
use tracing::instrument;
use upon::{Engine, Template};

pub const DEFAULT_TITLE_TEMPLATE: &str = "{{ title }}";
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str =
    "Volume: {{ volume }}, Page: {{ page }}, Siman: {{ siman }}, Seif: {{ seif }}";

/// Renders [`FeedItem`]s from recording [`Metadata`].
///
/// Templates are compiled eagerly in [`new`](Self::new) so that syntax errors
/// surface at startup rather than halfway through a batch.
#[derive(Debug)]
pub struct ItemTemplate {
    engine: Engine<'static>,
    title: Template<'static>,
    description: Template<'static>,
}
impl ItemTemplate {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        let engine = Engine::new();
        let title = engine.compile(title.into()).or_raise(|| ErrorKind::Template("title".to_string()))?;
        let description =
            engine.compile(description.into()).or_raise(|| ErrorKind::Template("description".to_string()))?;
        Ok(Self { engine, title, description })
    }

    #[instrument(skip_all, fields(volume = %metadata.volume, page = %metadata.page))]
    pub fn render(&self, metadata: &Metadata, link: impl Into<String>) -> Result<FeedItem> {
        let link = link.into();
        let parameters = Self::parameters(metadata, &link);
        let title = self
            .title
            .render(&self.engine, &parameters)
            .to_string()
            .or_raise(|| ErrorKind::Template("title".to_string()))?;
        let description = self
            .description
            .render(&self.engine, &parameters)
            .to_string()
            .or_raise(|| ErrorKind::Template("description".to_string()))?;
        Ok(FeedItem { title, link, description })
    }

    fn parameters(metadata: &Metadata, link: &str) -> upon::Value {
        upon::value! {
            volume: &metadata.volume,
            page: &metadata.page,
            siman: &metadata.siman,
            seif: &metadata.seif,
            title: &metadata.title,
            link: link,
        }
    }
}
impl Default for ItemTemplate {
    fn default() -> Self {
        // Infallible: the default templates are known to compile (see tests).
        match Self::new(DEFAULT_TITLE_TEMPLATE, DEFAULT_DESCRIPTION_TEMPLATE) {
            Ok(template) => template,
            Err(e) => unreachable!("default item templates must compile: {e}"),
        }
    }
}
