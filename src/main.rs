mod cli;
mod error;

use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use podfeed_config::{Config, Credentials};
use podfeed_publish::{Context, PublishEvent, Summary, publish};
use podfeed_storage::backend::{DropboxBackend, GithubBackend, ReadOnlyFeedStore};
use podfeed_storage::{FeedHandle, MediaHandle};
use std::pin::pin;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::builder().with_default_directive(args.log_level().into()).from_env_lossy())
        .init();

    match run(&args).await {
        Ok(summary) => {
            tracing::info!(
                discovered = summary.discovered,
                published = summary.published,
                skipped = summary.skipped,
                conflicts = summary.conflicts,
                dry_run = args.dry_run,
                "Done"
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!("{e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: &Args) -> Result<Summary> {
    // Everything that can fail locally fails here, before any network call.
    let config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let template = config.item_template().or_raise(|| ErrorKind::Config)?;
    let credentials = Credentials::from_env().or_raise(|| ErrorKind::Config)?;

    let media: MediaHandle = Arc::new(
        DropboxBackend::new("dropbox", credentials.dropbox.expose())
            .or_raise(|| ErrorKind::Backend)?
            .with_api_url(&config.dropbox.api_url),
    );
    let github = GithubBackend::new("github", credentials.github.expose(), &config.github.repository)
        .or_raise(|| ErrorKind::Backend)?
        .with_branch(config.github.branch.clone())
        .with_api_url(&config.github.api_url);
    let feed: FeedHandle = if args.dry_run {
        tracing::info!("Dry run: the feed will not be committed");
        Arc::new(ReadOnlyFeedStore::new(Arc::new(github)))
    } else {
        Arc::new(github)
    };

    let ctx = Context::new(media, feed, &config.github.feed_path)
        .with_extractor(config.extractor())
        .with_template(template)
        .with_commit_message(&config.github.commit_message)
        .with_max_conflict_retries(config.publish.max_conflict_retries)
        .with_malformed_policy(args.malformed_policy(&config));
    let discovery = args.discovery(&config);

    let mut events = pin!(publish(&ctx, &discovery));
    while let Some(event) = events.next().await {
        match event.or_raise(|| ErrorKind::Publish)? {
            PublishEvent::Started => tracing::debug!(?discovery, "Publishing started"),
            PublishEvent::DiscoveryComplete(count) => tracing::info!(count, "Found recordings to publish"),
            PublishEvent::Published(published) => tracing::info!(
                file = %published.file.name,
                link = %published.link,
                revision = %published.revision,
                "Published recording"
            ),
            PublishEvent::Skipped { file, error } => {
                tracing::warn!(file = %file.name, "Skipped recording: {error}");
            },
            PublishEvent::Complete(summary) => return Ok(summary),
        }
    }
    exn::bail!(ErrorKind::Publish)
}
