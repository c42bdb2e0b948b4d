//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Config;

/// Instagram account archiver CLI.
#[derive(Parser, Debug)]
#[command(
    name = "insta-archiver",
    version,
    about = "Archive public Instagram account data",
    long_about = "A CLI tool to archive an account's profile, posts, stories, highlights,\n\
                  followers and following through a third-party API provider.\n\n\
                  Raw API payloads are kept as timestamped snapshots and media already\n\
                  downloaded in earlier runs is skipped."
)]
pub struct Args {
    /// Username or numeric user id of the account to archive.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Action to run. Omit for the interactive menu.
    #[arg(long, value_enum)]
    pub action: Option<ActionArg>,

    /// Maximum number of items to process (posts/followers/following).
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Refetch from the remote API even when cached snapshots exist.
    #[arg(long)]
    pub update: bool,

    /// Base directory for account archives.
    #[arg(short = 'd', long = "directory")]
    pub output_directory: Option<PathBuf>,

    /// API provider tokens, comma separated.
    #[arg(short, long, env = "INSTA_ARCHIVER_TOKENS", value_delimiter = ',')]
    pub tokens: Option<Vec<String>>,

    /// Browser user agent string for media downloads.
    #[arg(short = 'a', long = "user-agent", env = "INSTA_ARCHIVER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Don't persist raw API payloads as snapshots.
    #[arg(long)]
    pub no_raw: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI action argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    /// Export profile info and the profile picture.
    Info,
    /// Download post media and captions.
    Posts,
    /// Fetch followers and persist the derived exports.
    Followers,
    /// Fetch followed accounts and persist the derived exports.
    Following,
    /// Download the live story reel.
    Stories,
    /// Download highlight reels.
    Highlights,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where
    /// specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(tokens) = &self.tokens {
            config.account.tokens = tokens.clone();
        }

        if let Some(user_agent) = &self.user_agent {
            config.account.user_agent = user_agent.clone();
        }

        if let Some(dir) = &self.output_directory {
            config.options.output_directory = Some(dir.clone());
        }

        if self.no_raw {
            config.options.save_raw = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_only_given_values() {
        let args = Args::parse_from([
            "insta-archiver",
            "--user",
            "someuser",
            "--tokens",
            "t1,t2",
            "--no-raw",
        ]);

        let mut config = Config::default();
        config.account.user_agent = "configured-agent".to_string();
        args.merge_into_config(&mut config);

        assert_eq!(config.account.tokens, vec!["t1", "t2"]);
        assert!(!config.options.save_raw);
        // Not given on the command line, so the config value stays.
        assert_eq!(config.account.user_agent, "configured-agent");
    }
}
