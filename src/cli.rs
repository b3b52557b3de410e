//! Command-line arguments.

use clap::{ArgAction, Parser};
use podfeed_config::Config;
use podfeed_publish::{Discovery, MalformedPolicy};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Publish recordings from Dropbox into the GitHub-hosted podcast feed.
///
/// Requires DROPBOX_ACCESS_TOKEN and GH_ACCESS_TOKEN in the environment.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Configuration file (.toml, .yaml or .json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Publish only this Dropbox file
    #[arg(long, value_name = "PATH", conflicts_with = "folder")]
    pub file: Option<String>,
    /// Publish every file in this Dropbox folder
    #[arg(long, value_name = "PATH")]
    pub folder: Option<String>,
    /// Create share links and build the feed, but don't commit it
    #[arg(long)]
    pub dry_run: bool,
    /// Skip files whose names can't be parsed instead of stopping
    #[arg(long)]
    pub skip_malformed: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
impl Args {
    /// Command-line flags win over configuration; a configured file wins over
    /// a configured folder.
    pub fn discovery(&self, config: &Config) -> Discovery {
        match (&self.file, &self.folder, &config.dropbox.file) {
            (Some(file), _, _) => Discovery::File(file.clone()),
            (None, Some(folder), _) => Discovery::Folder(folder.clone()),
            (None, None, Some(file)) => Discovery::File(file.clone()),
            (None, None, None) => Discovery::Folder(config.dropbox.folder.clone()),
        }
    }

    pub fn malformed_policy(&self, config: &Config) -> MalformedPolicy {
        if self.skip_malformed { MalformedPolicy::Skip } else { config.publish.on_malformed }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("podfeed").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_is_valid() {
        Args::command().debug_assert();
    }

    #[rstest]
    #[case(&[], None, Discovery::Folder("/MB".to_string()))]
    #[case(&[], Some("/MB/a.mp3"), Discovery::File("/MB/a.mp3".to_string()))]
    #[case(&["--folder", "/Other"], Some("/MB/a.mp3"), Discovery::Folder("/Other".to_string()))]
    #[case(&["--file", "/MB/b.mp3"], Some("/MB/a.mp3"), Discovery::File("/MB/b.mp3".to_string()))]
    fn test_discovery(#[case] args: &[&str], #[case] configured_file: Option<&str>, #[case] expected: Discovery) {
        let mut config = Config::default();
        config.dropbox.file = configured_file.map(ToString::to_string);
        assert_eq!(parse(args).discovery(&config), expected);
    }

    #[test]
    fn test_file_and_folder_conflict() {
        assert!(Args::try_parse_from(["podfeed", "--file", "/MB/a.mp3", "--folder", "/MB"]).is_err());
    }

    #[test]
    fn test_skip_malformed_flag() {
        let config = Config::default();
        assert_eq!(parse(&[]).malformed_policy(&config), MalformedPolicy::Abort);
        assert_eq!(parse(&["--skip-malformed"]).malformed_policy(&config), MalformedPolicy::Skip);
    }

    #[rstest]
    #[case(&[], LevelFilter::INFO)]
    #[case(&["-v"], LevelFilter::DEBUG)]
    #[case(&["-vvv"], LevelFilter::TRACE)]
    fn test_log_level(#[case] args: &[&str], #[case] expected: LevelFilter) {
        assert_eq!(parse(args).log_level(), expected);
    }
}
