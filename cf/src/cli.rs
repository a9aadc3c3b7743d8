//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// ChapterForge - generate books and chat with a remote language model
#[derive(Parser)]
#[command(
    name = "cf",
    about = "Generate chapter-by-chapter books as PDF, or chat with the same model",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `book`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate every chapter in a manifest and write the PDF
    Book {
        /// Book manifest (YAML); defaults to the configured manifest
        #[arg(value_name = "MANIFEST")]
        manifest: Option<PathBuf>,
    },

    /// Start an interactive conversation
    Chat,
}

/// Get the log file path used by chat mode
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chapterforge")
        .join("logs")
        .join("chapterforge.log");
    debug!(?path, "get_log_path: returning path");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["cf"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_book_with_manifest() {
        let cli = Cli::parse_from(["cf", "book", "my-book.yml"]);
        if let Some(Command::Book { manifest }) = cli.command {
            assert_eq!(manifest, Some(PathBuf::from("my-book.yml")));
        } else {
            panic!("Expected Book command");
        }
    }

    #[test]
    fn test_cli_parse_book_default_manifest() {
        let cli = Cli::parse_from(["cf", "book"]);
        assert!(matches!(cli.command, Some(Command::Book { manifest: None })));
    }

    #[test]
    fn test_cli_parse_chat() {
        let cli = Cli::parse_from(["cf", "chat"]);
        assert!(matches!(cli.command, Some(Command::Chat)));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["cf", "chat", "-c", "/path/to/config.yml", "--log-level", "debug"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_log_path_ends_with_log_file() {
        assert!(get_log_path().ends_with("chapterforge/logs/chapterforge.log"));
    }
}
