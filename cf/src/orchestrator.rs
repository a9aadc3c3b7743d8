//! Sequential chapter generation with running word/page totals
//!
//! Chapters are generated strictly one after another against a shared remote
//! endpoint. The first chapter that exhausts its retries aborts the whole run;
//! no partial book is produced.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::generator::{GenerationError, SectionGenerator};
use crate::text::{clean_generated_text, word_count};

/// Errors from an orchestration run
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Chapter {} (prompt index {}) failed: {}", .index + 1, .index, .source)]
    ChapterFailed {
        index: usize,
        #[source]
        source: GenerationError,
    },

    #[error("No chapter prompts given")]
    NoPrompts,
}

impl OrchestratorError {
    /// Index of the prompt that failed, if the run got that far
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            OrchestratorError::ChapterFailed { index, .. } => Some(*index),
            OrchestratorError::NoPrompts => None,
        }
    }
}

/// One successfully generated chapter
///
/// Fields are private; a record cannot be altered after the orchestrator
/// creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRecord {
    index: usize,
    prompt: String,
    text: String,
    word_count: usize,
    estimated_pages: usize,
}

impl SectionRecord {
    /// Build a record from raw endpoint output
    ///
    /// The text is cleaned first; counts are derived from the cleaned text.
    pub fn new(index: usize, prompt: impl Into<String>, raw_text: &str, words_per_page: usize) -> Self {
        let text = clean_generated_text(raw_text);
        let word_count = word_count(&text);
        let estimated_pages = word_count.checked_div(words_per_page).unwrap_or(0);
        Self {
            index,
            prompt: prompt.into(),
            text,
            word_count,
            estimated_pages,
        }
    }

    /// 0-based position of the chapter
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Cleaned chapter text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn estimated_pages(&self) -> usize {
        self.estimated_pages
    }
}

/// Running totals across the records of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateMetrics {
    pub total_words: usize,
    pub total_pages: usize,
}

impl AggregateMetrics {
    /// Fold one record into the totals
    pub fn record(&mut self, section: &SectionRecord) {
        self.total_words += section.word_count();
        self.total_pages += section.estimated_pages();
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct BookRun {
    pub sections: Vec<SectionRecord>,
    pub metrics: AggregateMetrics,
}

/// Per-run generation parameters
#[derive(Debug, Clone)]
pub struct ChapterParams {
    /// System context for every chapter; `None` uses each chapter's prompt
    pub system_context: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub words_per_page: usize,
}

impl Default for ChapterParams {
    fn default() -> Self {
        Self {
            system_context: None,
            max_tokens: 4_000,
            temperature: 0.6,
            words_per_page: crate::DEFAULT_WORDS_PER_PAGE,
        }
    }
}

/// Drives the section generator over an ordered list of prompts
pub struct ChapterOrchestrator {
    generator: SectionGenerator,
    params: ChapterParams,
}

impl ChapterOrchestrator {
    pub fn new(generator: SectionGenerator, params: ChapterParams) -> Self {
        debug!(?params, "ChapterOrchestrator::new: called");
        Self { generator, params }
    }

    /// Generate every chapter in order
    ///
    /// On success the records line up one-to-one with `prompts` and the
    /// metrics equal the sums of the per-record values.
    pub async fn run<S: AsRef<str>>(&self, prompts: &[S]) -> Result<BookRun, OrchestratorError> {
        debug!(prompt_count = prompts.len(), "run: called");
        if prompts.is_empty() {
            return Err(OrchestratorError::NoPrompts);
        }

        let mut sections = Vec::with_capacity(prompts.len());
        let mut metrics = AggregateMetrics::default();

        for (index, prompt) in prompts.iter().enumerate() {
            let prompt = prompt.as_ref();
            let chapter = index + 1;
            info!(chapter, "Generating content for chapter");

            let system_context = self.params.system_context.as_deref().unwrap_or(prompt);
            let raw = self
                .generator
                .generate(prompt, system_context, self.params.max_tokens, self.params.temperature)
                .await
                .map_err(|source| {
                    error!(chapter, error = %source, "Chapter generation exhausted, aborting run");
                    OrchestratorError::ChapterFailed { index, source }
                })?;

            let section = SectionRecord::new(index, prompt, &raw, self.params.words_per_page);
            metrics.record(&section);
            info!(
                chapter,
                words = section.word_count(),
                pages = section.estimated_pages(),
                "Chapter generated"
            );
            info!(
                total_words = metrics.total_words,
                total_pages = metrics.total_pages,
                "Total word count so far"
            );
            sections.push(section);
        }

        Ok(BookRun { sections, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RetryPolicy;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use std::sync::Arc;
    use std::time::Duration;

    fn orchestrator(client: Arc<MockLlmClient>, params: ChapterParams) -> ChapterOrchestrator {
        let generator = SectionGenerator::new(
            client,
            RetryPolicy {
                max_retries: 2,
                backoff: Duration::ZERO,
            },
        );
        ChapterOrchestrator::new(generator, params)
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_section_record_counts_cleaned_text() {
        let record = SectionRecord::new(3, "prompt", "assistant\n\nTitle\none two three", 400);
        assert_eq!(record.index(), 3);
        assert_eq!(record.text(), "Title\none two three");
        assert_eq!(record.word_count(), 4);
        assert_eq!(record.estimated_pages(), 0);
    }

    #[test]
    fn test_pages_use_floor_division() {
        assert_eq!(SectionRecord::new(0, "p", &words(399), 400).estimated_pages(), 0);
        assert_eq!(SectionRecord::new(0, "p", &words(400), 400).estimated_pages(), 1);
        assert_eq!(SectionRecord::new(0, "p", &words(1199), 400).estimated_pages(), 2);
    }

    #[tokio::test]
    async fn test_run_preserves_order_and_sums() {
        let texts = [words(850), words(10), words(400)];
        let client = Arc::new(MockLlmClient::texts(texts.clone()));
        let prompts = ["first", "second", "third"];

        let run = orchestrator(client, ChapterParams::default()).run(&prompts).await.unwrap();

        assert_eq!(run.sections.len(), 3);
        for (i, section) in run.sections.iter().enumerate() {
            assert_eq!(section.index(), i);
            assert_eq!(section.prompt(), prompts[i]);
            assert_eq!(section.text(), texts[i]);
        }
        assert_eq!(run.metrics.total_words, 850 + 10 + 400);
        assert_eq!(run.metrics.total_pages, 2 + 1);
        assert_eq!(
            run.metrics.total_words,
            run.sections.iter().map(SectionRecord::word_count).sum::<usize>()
        );
        assert_eq!(
            run.metrics.total_pages,
            run.sections.iter().map(SectionRecord::estimated_pages).sum::<usize>()
        );
    }

    #[tokio::test]
    async fn test_prompt_doubles_as_system_context_by_default() {
        let client = Arc::new(MockLlmClient::texts(["One", "Two"]));
        orchestrator(client.clone(), ChapterParams::default())
            .run(&["alpha", "beta"])
            .await
            .unwrap();

        let requests = client.requests();
        assert_eq!(requests[0].prompt, "alpha");
        assert_eq!(requests[0].system_context, "alpha");
        assert_eq!(requests[1].system_context, "beta");
    }

    #[tokio::test]
    async fn test_shared_system_context() {
        let client = Arc::new(MockLlmClient::texts(["One"]));
        let params = ChapterParams {
            system_context: Some("You write self-help books.".to_string()),
            ..Default::default()
        };
        orchestrator(client.clone(), params).run(&["alpha"]).await.unwrap();

        assert_eq!(client.requests()[0].system_context, "You write self-help books.");
    }

    #[tokio::test]
    async fn test_failure_aborts_with_index() {
        // Chapter 1 ok, chapter 2 fails both attempts, chapter 3 never runs
        let client = Arc::new(MockLlmClient::new(vec![
            MockReply::text("One"),
            MockReply::fail("down"),
            MockReply::fail("still down"),
            MockReply::text("never used"),
        ]));

        let err = orchestrator(client.clone(), ChapterParams::default())
            .run(&["a", "b", "c"])
            .await
            .unwrap_err();

        assert_eq!(err.failed_index(), Some(1));
        assert!(err.to_string().contains("Chapter 2"));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_prompt_list() {
        let client = Arc::new(MockLlmClient::texts(Vec::<String>::new()));
        let err = orchestrator(client, ChapterParams::default())
            .run::<&str>(&[])
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NoPrompts));
    }
}
