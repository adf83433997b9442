//! Command-line interface for youlearn.

use clap::{Parser, Subcommand};

/// YouLearn - YouTube transcripts and AI summaries
///
/// Resolves a YouTube video reference, retrieves its transcript through a
/// chain of caption strategies with a speech-to-text fallback, and
/// optionally summarizes it with an AI provider.
#[derive(Parser, Debug)]
#[command(name = "youlearn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init,

    /// Retrieve the transcript of a video
    Transcript {
        /// YouTube URL or bare video ID
        url: String,
    },

    /// Retrieve the transcript and summarize it
    Summarize {
        /// YouTube URL or bare video ID
        url: String,

        /// AI provider to summarize with (openai, deepseek)
        #[arg(short, long, default_value = "openai")]
        provider: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_command_parses() {
        let cli = Cli::parse_from(["youlearn", "transcript", "https://youtu.be/abcdefghijk"]);
        match cli.command {
            Commands::Transcript { url } => {
                assert_eq!(url, "https://youtu.be/abcdefghijk");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_summarize_defaults_to_openai() {
        let cli = Cli::parse_from(["youlearn", "summarize", "abcdefghijk"]);
        match cli.command {
            Commands::Summarize { provider, .. } => assert_eq!(provider, "openai"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::parse_from(["youlearn", "-vv", "transcript", "abcdefghijk"]);
        assert_eq!(cli.verbose, 2);
    }
}
