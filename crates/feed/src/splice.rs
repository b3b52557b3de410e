//! Inserting items into a feed document.

use crate::FeedItem;
use crate::error::{ErrorKind, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::instrument;

const CHANNEL: &[u8] = b"channel";

/// Inserts `item` immediately before the closing tag of the feed's first
/// `<channel>` element.
///
/// The document is scanned with a pull parser only far enough to find that
/// closing tag, so a `</channel>` inside a comment or CDATA section is never
/// mistaken for the anchor. The item is then written into the original text:
/// every byte outside the insertion point is preserved, and the result differs
/// from the input only by the inserted fragment (a line break, the item, and a
/// line break before `</channel>`).
///
/// No deduplication takes place; splicing the same item twice produces two
/// identical entries.
///
/// # Errors
///
/// - [`MissingChannelTag`](ErrorKind::MissingChannelTag) if the document has
///   no channel element with a closing tag.
/// - [`MalformedFeed`](ErrorKind::MalformedFeed) if the document is not
///   well-formed before the channel closes.
///
/// ```
/// use podfeed_feed::{FeedItem, splice};
///
/// let item = FeedItem::new("T", "https://dl.example/abc", "D");
/// let feed = splice("<rss><channel></channel></rss>", &item).unwrap();
/// assert!(feed.ends_with("</item>\n</channel></rss>"));
/// ```
#[instrument(skip_all, fields(feed_size = feed.len()))]
pub fn splice(feed: &str, item: &FeedItem) -> Result<String> {
    let anchor = channel_close_offset(feed)?;
    let (head, tail) = feed.split_at(anchor);
    let fragment = item.to_string();
    let mut output = String::with_capacity(feed.len() + fragment.len() + 2);
    output.push_str(head);
    output.push('\n');
    output.push_str(&fragment);
    output.push('\n');
    output.push_str(tail);
    tracing::debug!(position = anchor, bytes = fragment.len(), "Item inserted before channel closing tag");
    Ok(output)
}

/// Byte offset of the `<` that opens the first channel element's end tag.
fn channel_close_offset(feed: &str) -> Result<usize> {
    let mut reader = Reader::from_str(feed);
    let mut depth: usize = 0;
    let mut channel_depth: Option<usize> = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if channel_depth.is_none() && e.local_name().as_ref() == CHANNEL {
                    channel_depth = Some(depth);
                }
            },
            Ok(Event::End(e)) => {
                if channel_depth == Some(depth) && e.local_name().as_ref() == CHANNEL {
                    // The reader now sits just past the end tag's `>`. End tags
                    // can't contain `<`, so the last one before here opens it.
                    let end = usize::try_from(reader.buffer_position())
                        .map_err(|_| exn::Exn::from(ErrorKind::MalformedFeed("document too large".to_string())))?;
                    return feed[..end]
                        .rfind("</")
                        .ok_or_else(|| exn::Exn::from(ErrorKind::MissingChannelTag));
                }
                depth = depth.saturating_sub(1);
            },
            Ok(Event::Eof) => exn::bail!(ErrorKind::MissingChannelTag),
            Err(e) => {
                let position = reader.error_position();
                exn::bail!(ErrorKind::MalformedFeed(format!("{e} (at byte {position})")));
            },
            Ok(_) => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn make_item() -> FeedItem {
        FeedItem::new(
            "No big meals on Erev Shabbos unless a timely seudas mitzvah",
            "https://dl.example/abc",
            "Volume: MB3, Page: 14a, Siman: 249, Seif: 2a",
        )
    }

    #[test]
    fn test_matches_expected_document() {
        let feed = "<rss><channel><title>X</title></channel></rss>";
        let expected = "<rss><channel><title>X</title>\n    <item>\n        <title>No big meals on Erev Shabbos unless a timely seudas mitzvah</title>\n        <link>https://dl.example/abc</link>\n        <description>Volume: MB3, Page: 14a, Siman: 249, Seif: 2a</description>\n    </item>\n</channel></rss>";
        assert_eq!(splice(feed, &make_item()).unwrap(), expected);
    }

    #[rstest]
    #[case("<rss><channel><title>X</title></channel></rss>")]
    #[case("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n  <channel>\n    <title>X</title>\n  </channel>\n</rss>\n")]
    #[case("<rss><channel><item><title>Old</title></item></channel></rss>")]
    #[case("<rss><channel><!-- </channel> --><title>X</title></channel></rss>")]
    #[case("<rss><channel><description><![CDATA[</channel>]]></description></channel></rss>")]
    #[case("<rss xmlns:itunes=\"http://www.itunes.com/dtds/podcast-1.0.dtd\"><channel><itunes:author>A</itunes:author></channel ></rss>")]
    fn test_preserves_surrounding_bytes(#[case] feed: &str) {
        let item = make_item();
        let output = splice(feed, &item).unwrap();
        let fragment = format!("\n{item}\n");
        assert_eq!(output.len(), feed.len() + fragment.len());
        assert_eq!(output.matches("<item>").count(), feed.matches("<item>").count() + 1);
        // Removing the fragment gives back the original document, byte-for-byte.
        let position = output.find(&fragment).unwrap();
        assert_eq!(format!("{}{}", &output[..position], &output[position + fragment.len()..]), feed);
        // And the fragment sits directly before the real closing tag.
        assert!(output[position + fragment.len()..].starts_with("</channel"));
    }

    #[test]
    fn test_inserts_into_first_channel_only() {
        let feed = "<root><channel></channel><channel></channel></root>";
        let output = splice(feed, &make_item()).unwrap();
        assert!(output.starts_with("<root><channel>\n    <item>"));
        assert!(output.ends_with("</item>\n</channel><channel></channel></root>"));
    }

    #[test]
    fn test_ignores_nested_channel_like_elements() {
        let feed = "<rss><channel><x><channel></channel></x></channel></rss>";
        let output = splice(feed, &make_item()).unwrap();
        assert!(output.ends_with("</x>\n    <item>\n        <title>No big meals on Erev Shabbos unless a timely seudas mitzvah</title>\n        <link>https://dl.example/abc</link>\n        <description>Volume: MB3, Page: 14a, Siman: 249, Seif: 2a</description>\n    </item>\n</channel></rss>"));
    }

    #[test]
    fn test_splicing_twice_duplicates() {
        let feed = "<rss><channel></channel></rss>";
        let once = splice(feed, &make_item()).unwrap();
        let twice = splice(&once, &make_item()).unwrap();
        assert_eq!(twice.matches("<item>").count(), 2);
        assert_eq!(twice.matches("<link>https://dl.example/abc</link>").count(), 2);
    }

    #[rstest]
    #[case("<rss></rss>")]
    #[case("")]
    #[case("<rss><channel/></rss>")]
    #[case("<rss><!-- </channel> --></rss>")]
    fn test_missing_channel_tag(#[case] feed: &str) {
        let err = splice(feed, &make_item()).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingChannelTag);
    }

    #[test]
    fn test_malformed_feed() {
        let err = splice("<rss><channel><title>X</oops></channel></rss>", &make_item()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedFeed(_)));
    }

    #[test]
    fn test_escapes_values() {
        let item = FeedItem::new("A & B", "https://dl.example/?a=1&b=2", "<b>bold</b>");
        let output = splice("<rss><channel></channel></rss>", &item).unwrap();
        assert!(output.contains("<title>A &amp; B</title>"));
        assert!(output.contains("<link>https://dl.example/?a=1&amp;b=2</link>"));
        assert!(output.contains("<description>&lt;b&gt;bold&lt;/b&gt;</description>"));
        // The escaped document is still well-formed.
        assert!(splice(&output, &item).is_ok());
    }
}
