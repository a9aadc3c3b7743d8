//! ChapterForge - long-form content generation over a remote language model
//!
//! ChapterForge drives a generative text endpoint to write a book one
//! chapter at a time and lays the chapters out as a PDF. The same generation
//! contract powers a small conversational bot with persistent history and
//! spoken replies.
//!
//! # Core Concepts
//!
//! - **Bounded Retries**: Every generation call gets a fixed number of attempts with a fixed pause between them
//! - **Sequential Chapters**: Chapters are generated strictly in order; a failed chapter stops the run
//! - **All or Nothing Output**: The PDF is written once, only after every chapter succeeds
//! - **Windowed Memory**: Chat replies see only the most recent turns; the full log is kept on disk
//!
//! # Modules
//!
//! - [`llm`] - Endpoint trait and the Gradio/OpenAI providers
//! - [`generator`] - Retry-governed section generation
//! - [`orchestrator`] - Chapter sequencing and metrics
//! - [`document`] - Document structure and PDF rendering
//! - [`book`] - End-to-end chapter pipeline
//! - [`chat`] - Conversation session and interactive loop
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod book;
pub mod chat;
pub mod cli;
pub mod config;
pub mod document;
pub mod generator;
pub mod llm;
pub mod orchestrator;
pub mod persist;
pub mod text;

/// Words per estimated page
pub const DEFAULT_WORDS_PER_PAGE: usize = 400;

/// Turns of history given to the model as context
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Speaker labels used in prompts, the terminal and plain-text history
pub const DEFAULT_USER_LABEL: &str = "You";
pub const DEFAULT_BOT_LABEL: &str = "ChadGPT";

// Re-export commonly used types
pub use book::{BookError, BookManifest, BookReport, run_book};
pub use chat::{ConversationSession, ConversationTurn, HistoryStore, StorageError};
pub use config::Config;
pub use document::{DocumentStructure, PdfRenderer, RenderError};
pub use generator::{GenerationError, RetryPolicy, SectionGenerator};
pub use llm::{GenerationRequest, GenerationResponse, LlmClient, LlmError, create_client};
pub use orchestrator::{AggregateMetrics, ChapterOrchestrator, OrchestratorError, SectionRecord};
pub use text::{clean_generated_text, word_count};
