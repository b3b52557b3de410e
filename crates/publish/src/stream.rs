use crate::error::{Error, ErrorKind, Result};
use crate::{Context, Discovery, MalformedPolicy, Published, publish_file};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use podfeed_storage::RemoteFile;

/// Progress events emitted by [`publish`] as it works through the discovered
/// recordings.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of recordings found.
/// 3. [`Published`](Self::Published) or [`Skipped`](Self::Skipped): once per
///    recording, in discovery order.
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// The first error terminates the stream, in which case
/// [`Complete`](Self::Complete) is never emitted. Recordings published before
/// the error stay published.
#[derive(Debug)]
pub enum PublishEvent {
    /// Publishing has begun; emitted exactly once before any other event.
    Started,
    /// All recordings have been discovered; the total count is now known.
    DiscoveryComplete(u64),
    /// A recording has been added to the feed.
    Published(Published),
    /// A recording was left out because its filename is malformed. Only
    /// emitted under [`MalformedPolicy::Skip`].
    Skipped { file: RemoteFile, error: Error },
    /// Every discovered recording has been handled; the stream is finished.
    Complete(Summary),
}

/// Totals for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub discovered: u64,
    pub published: u64,
    pub skipped: u64,
    /// Conflicts that were resolved by re-fetching the feed.
    pub conflicts: u64,
}

/// Streams [`PublishEvent`]s for every recording found by `discovery`,
/// publishing each one through [`publish_file`] according to `ctx`.
///
/// Recordings are handled one at a time, in discovery order. No
/// deduplication takes place: a recording that is already in the feed (or
/// discovered twice) is added again.
pub fn publish<'a>(ctx: &'a Context, discovery: &'a Discovery) -> impl Stream<Item = Result<PublishEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(PublishEvent::Started);

        let files = match discovery
            .discover(&*ctx.media)
            .await
            .or_raise(|| ErrorKind::Discovery(discovery.location().to_string()))
        {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let mut summary = Summary {
            // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
            discovered: u64::try_from(files.len()).unwrap_or(0),
            ..Summary::default()
        };
        tracing::info!(location = discovery.location(), count = summary.discovered, "Discovered recordings");
        yield Ok(PublishEvent::DiscoveryComplete(summary.discovered));

        for file in files {
            match publish_file(ctx, &file).await {
                Ok(published) => {
                    summary.published += 1;
                    summary.conflicts += u64::from(published.attempts.saturating_sub(1));
                    yield Ok(PublishEvent::Published(published));
                },
                Err(e) if matches!(&*e, ErrorKind::Extract(_)) && ctx.on_malformed == MalformedPolicy::Skip => {
                    tracing::warn!(file = %file.name, "Skipping recording with malformed filename");
                    summary.skipped += 1;
                    yield Ok(PublishEvent::Skipped { file, error: e });
                },
                Err(e) => {
                    yield Err(e);
                    return;
                },
            }
        }

        yield Ok(PublishEvent::Complete(summary));
    })
}
