use crate::Context;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use podfeed_feed::{FeedItem, splice};
use podfeed_storage::Revision;
use tracing::instrument;

/// The outcome of successfully appending an item to the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    /// Revision of the feed document after the commit.
    pub revision: Revision,
    /// Number of fetch/splice/write rounds it took; `1` unless a concurrent
    /// writer got in first.
    pub attempts: u32,
}

/// Appends `item` to the feed document and commits it.
///
/// Each attempt fetches the current document, splices the item in and
/// writes it back against the fetched revision. If the store reports that the
/// document changed in the meantime, the whole round is repeated on the
/// fresh document, up to [`Context::max_conflict_retries`] more times. The
/// item is never merged into a stale copy.
///
/// # Errors
///
/// - [`ErrorKind::Fetch`] / [`ErrorKind::Write`] when the feed store fails.
/// - [`ErrorKind::Splice`] when the document has no channel to insert into.
/// - [`ErrorKind::Conflict`] when every attempt lost to a concurrent writer.
#[instrument(skip_all, fields(feed = %ctx.feed_path))]
pub async fn append_item(ctx: &Context, item: &FeedItem) -> Result<Appended> {
    let max_attempts = ctx.max_conflict_retries.saturating_add(1);
    let mut attempts = 0;
    loop {
        attempts += 1;
        let fetched = ctx.feed.fetch(&ctx.feed_path).await.or_raise(|| ErrorKind::Fetch(ctx.feed_path.clone()))?;
        let updated = splice(&fetched.content, item).or_raise(|| ErrorKind::Splice)?;
        match ctx.feed.write(&ctx.feed_path, &updated, &fetched.revision, &ctx.commit_message).await {
            Ok(revision) => return Ok(Appended { revision, attempts }),
            Err(e) if e.is_conflict() && attempts < max_attempts => {
                tracing::warn!(attempts, max_attempts, revision = %fetched.revision, "Feed changed since it was fetched; retrying");
            },
            Err(e) if e.is_conflict() => return Err(e).or_raise(|| ErrorKind::Conflict { attempts }),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Write(ctx.feed_path.clone())),
        }
    }
}
