use quick_xml::escape::partial_escape;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Indentation of an `<item>` relative to its channel.
pub(crate) const ITEM_INDENT: &str = "    ";
/// Indentation of an item's child elements.
const FIELD_INDENT: &str = "        ";

/// A single feed entry, one per published recording.
///
/// Values are stored unescaped; escaping happens when the item is written
/// out via [`Display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    /// Public share link of the recording.
    pub link: String,
    pub description: String,
}
impl FeedItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: description.into(),
        }
    }
}

impl Display for FeedItem {
    /// Writes the `<item>` element without leading or trailing line breaks.
    ///
    /// `<`, `>` and `&` are escaped in every value; quotes are left alone as
    /// they are legal in text content.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{ITEM_INDENT}<item>")?;
        writeln!(f, "{FIELD_INDENT}<title>{}</title>", partial_escape(&self.title))?;
        writeln!(f, "{FIELD_INDENT}<link>{}</link>", partial_escape(&self.link))?;
        writeln!(f, "{FIELD_INDENT}<description>{}</description>", partial_escape(&self.description))?;
        write!(f, "{ITEM_INDENT}</item>")
    }
}
