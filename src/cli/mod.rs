//! CLI module - Command-line interface for gooji
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gooji - record, upload and browse short language videos
#[derive(Parser)]
#[command(name = "gooji")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (defaults to the standard search locations)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    Init,

    /// Validate config, storage directories and ffmpeg
    Check,

    /// List stored videos
    #[command(alias = "ls", alias = "l")]
    List,

    /// Delete a video, its metadata and its thumbnail
    #[command(alias = "rm")]
    Delete {
        /// Video ID
        id: String,
    },
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::parse_from(["gooji"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["gooji", "rm", "1700000000_abc"]);
        assert!(matches!(cli.command, Some(Commands::Delete { ref id }) if id == "1700000000_abc"));

        let cli = Cli::parse_from(["gooji", "list", "--config", "/etc/gooji.toml"]);
        assert!(matches!(cli.command, Some(Commands::List)));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/gooji.toml")));
    }
}
