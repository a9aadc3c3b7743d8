//! ChapterForge - chapter-by-chapter book generation
//!
//! CLI entry point for the book pipeline and the chat bot.

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use chapterforge::book::{BookManifest, run_book};
use chapterforge::chat::{ChatRepl, ConversationSession, HistoryStore, SessionParams, Speaker};
use chapterforge::cli::{Cli, Command, get_log_path};
use chapterforge::config::Config;
use chapterforge::document::PdfRenderer;
use chapterforge::generator::{RetryPolicy, SectionGenerator};
use chapterforge::llm::create_client;

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogTarget {
    /// Book runs: progress on stderr
    Stderr,
    /// Chat: a file, so logs do not interleave with the conversation
    File,
}

fn parse_level(level_str: Option<&str>) -> tracing::Level {
    match level_str.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, target: LogTarget) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = parse_level(cli_log_level.or(config_log_level));
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_writer(io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogTarget::File => {
            let log_path = get_log_path();
            let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            fs::create_dir_all(&log_dir).context("Failed to create log directory")?;
            let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

            tracing_subscriber::fmt()
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
    }

    info!("Logging initialized (level: {:?}, target: {:?})", level, target);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    let target = match cli.command {
        Some(Command::Chat) => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref(), target)
        .context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, endpoint = %config.llm.base_url, "ChapterForge loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Book { manifest }) => {
            debug!(?manifest, "main: matched Book command");
            cmd_book(&config, manifest).await
        }
        Some(Command::Chat) => {
            debug!("main: matched Chat command");
            cmd_chat(&config).await
        }
        None => {
            debug!("main: no command, running book");
            cmd_book(&config, None).await
        }
    }
}

fn section_generator(config: &Config) -> Result<SectionGenerator> {
    let client = create_client(&config.llm).context("Failed to create generation client")?;
    Ok(SectionGenerator::new(client, RetryPolicy::from(&config.generation)))
}

async fn cmd_book(config: &Config, manifest: Option<PathBuf>) -> Result<()> {
    let manifest_path = manifest.unwrap_or_else(|| config.book.manifest.clone());
    debug!(?manifest_path, "cmd_book: called");

    let manifest = BookManifest::load(&manifest_path)?;
    let generator = section_generator(config)?;
    let renderer = PdfRenderer::new(&config.book.font_dir, &config.book.font_family);

    let report = run_book(generator, &renderer, config, &manifest)
        .await
        .context("Book generation failed")?;

    println!("{} {}", "PDF created:".green().bold(), report.output.display());
    println!(
        "  {} chapters, {} words, ~{} pages",
        report.chapters, report.metrics.total_words, report.metrics.total_pages
    );
    Ok(())
}

async fn cmd_chat(config: &Config) -> Result<()> {
    debug!(history = ?config.chat.history_file, "cmd_chat: called");
    let generator = section_generator(config)?;
    let store =
        HistoryStore::new(&config.chat.history_file).with_labels(&config.chat.user_label, &config.chat.bot_label);
    let session = ConversationSession::open(generator, store, SessionParams::from(&config.chat))
        .context("Failed to load conversation history")?;

    let speaker = match Speaker::from_config(&config.chat.speech) {
        Ok(speaker) => speaker,
        Err(e) => {
            warn!(error = %e, "Speech disabled");
            println!("{} {}; continuing without speech", "Warning:".yellow(), e);
            None
        }
    };

    ChatRepl::new(session, speaker, config.chat.clone()).run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("debug")), tracing::Level::DEBUG);
        assert_eq!(parse_level(Some("WARNING")), tracing::Level::WARN);
        assert_eq!(parse_level(Some("nonsense")), tracing::Level::INFO);
        assert_eq!(parse_level(None), tracing::Level::INFO);
    }
}
