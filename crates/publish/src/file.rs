use crate::error::{ErrorKind, Result};
use crate::{Context, append_item};
use exn::ResultExt;
use podfeed_extract::models::Metadata;
use podfeed_storage::{RemoteFile, Revision};
use tracing::instrument;

/// A recording that made it into the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub file: RemoteFile,
    pub metadata: Metadata,
    pub link: String,
    /// Feed revision after this recording's item was committed.
    pub revision: Revision,
    /// Fetch/splice/write rounds needed; more than one means conflicts were
    /// resolved along the way.
    pub attempts: u32,
}

/// Publishes a single recording: extracts its metadata, creates a public
/// share link, renders a feed item and appends it to the feed.
///
/// Metadata is extracted before any remote call, so a malformed filename
/// never leaves a share link behind.
///
/// # Errors
///
/// [`ErrorKind::Extract`] for a malformed filename, [`ErrorKind::ShareLink`]
/// when the media source refuses the link, plus anything
/// [`append_item`] returns.
#[instrument(skip_all, fields(file = %file.name))]
pub async fn publish_file(ctx: &Context, file: &RemoteFile) -> Result<Published> {
    let metadata = ctx.extractor.extract(&file.name).or_raise(|| ErrorKind::Extract(file.name.clone()))?;
    let link = ctx.media.resolve_link(&file.path).await.or_raise(|| ErrorKind::ShareLink(file.path.clone()))?;
    let item = ctx.template.render(&metadata, link.as_str()).or_raise(|| ErrorKind::Template)?;
    let appended = append_item(ctx, &item).await?;
    tracing::info!(title = %item.title, link = %link, revision = %appended.revision, "Added recording to feed");
    Ok(Published {
        file: file.clone(),
        metadata,
        link,
        revision: appended.revision,
        attempts: appended.attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use podfeed_feed::ItemTemplate;
    use podfeed_storage::backend::{MockFeedStore, MockMediaSource};
    use std::sync::Arc;

    const FEED: &str = "<rss><channel><title>X</title></channel></rss>";
    const PATH: &str = "/MB/MB3 14a 249:2a No big meals on Erev Shabbos unless a timely seudas mitzvah.mp3";

    #[tokio::test]
    async fn test_publishes_expected_item() {
        let media = Arc::new(MockMediaSource::with_files([PATH]).with_link(PATH, "https://dl.example/abc"));
        let store = Arc::new(MockFeedStore::with_file("feed.xml", FEED));
        let ctx = Context::new(media, store.clone(), "feed.xml");
        let published = publish_file(&ctx, &RemoteFile::from_path(PATH)).await.unwrap();
        assert_eq!(published.metadata.siman, "249");
        assert_eq!(published.link, "https://dl.example/abc");
        assert_eq!(published.attempts, 1);
        assert_eq!(
            store.content("feed.xml").await.unwrap(),
            "<rss><channel><title>X</title>\n    <item>\n        <title>No big meals on Erev Shabbos unless a timely seudas mitzvah</title>\n        <link>https://dl.example/abc</link>\n        <description>Volume: MB3, Page: 14a, Siman: 249, Seif: 2a</description>\n    </item>\n</channel></rss>"
        );
    }

    #[tokio::test]
    async fn test_malformed_name_makes_no_remote_calls() {
        let media = Arc::new(MockMediaSource::with_files(["/MB/notes.mp3"]));
        let store = Arc::new(MockFeedStore::with_file("feed.xml", FEED));
        let ctx = Context::new(media.clone(), store.clone(), "feed.xml");
        let err = publish_file(&ctx, &RemoteFile::from_path("/MB/notes.mp3")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Extract("notes.mp3".to_string()));
        assert!(media.resolved().await.is_empty());
        assert_eq!(store.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_share_link_failure_leaves_feed_untouched() {
        let media = Arc::new(MockMediaSource::with_files([PATH]).with_failing_link(PATH));
        let store = Arc::new(MockFeedStore::with_file("feed.xml", FEED));
        let ctx = Context::new(media, store.clone(), "feed.xml");
        let err = publish_file(&ctx, &RemoteFile::from_path(PATH)).await.unwrap_err();
        assert_eq!(*err, ErrorKind::ShareLink(PATH.to_string()));
        assert_eq!(store.content("feed.xml").await.as_deref(), Some(FEED));
    }

    #[tokio::test]
    async fn test_custom_template() {
        let media = Arc::new(MockMediaSource::with_files([PATH]));
        let store = Arc::new(MockFeedStore::with_file("feed.xml", FEED));
        let template = ItemTemplate::new("{{ siman }}:{{ seif }} {{ title }}", "{{ volume }}/{{ page }}").unwrap();
        let ctx = Context::new(media, store.clone(), "feed.xml").with_template(template);
        publish_file(&ctx, &RemoteFile::from_path(PATH)).await.unwrap();
        let content = store.content("feed.xml").await.unwrap();
        assert!(content.contains("<title>249:2a No big meals on Erev Shabbos unless a timely seudas mitzvah</title>"));
        assert!(content.contains("<description>MB3/14a</description>"));
    }
}
