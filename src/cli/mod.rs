//! CLI module for podrag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// podrag - ask questions about podcast episodes
///
/// Syncs podcast transcripts from a bucket, indexes them into a local vector
/// collection and answers questions with episode attribution.
#[derive(Parser, Debug)]
#[command(name = "podrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PODRAG_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download new transcripts from the bucket into the data directory
    Sync,

    /// Rebuild the vector collection from the transcripts in the data directory
    Build {
        /// Sync from the bucket before building
        #[arg(long)]
        sync: bool,
    },

    /// Start an interactive question loop
    Query,

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,
    },

    /// Show the transcript chunks most similar to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "6")]
        limit: usize,
    },

    /// List indexed episodes
    List,

    /// List dated bucket folders newer than the cutoff date
    Folders {
        /// Bucket prefix to list (defaults to the transcripts prefix)
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Upload a file or folder to the bucket
    Upload {
        /// Local file or folder
        path: String,

        /// Destination key (file) or sub-folder (folder)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_with_sync() {
        let cli = Cli::try_parse_from(["podrag", "-vv", "build", "--sync"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Build { sync: true }));
    }

    #[test]
    fn test_parse_search_limit() {
        let cli = Cli::try_parse_from(["podrag", "search", "rust", "--limit", "3"]).unwrap();
        match cli.command {
            Commands::Search { query, limit } => {
                assert_eq!(query, "rust");
                assert_eq!(limit, 3);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["podrag"]).is_err());
    }
}
