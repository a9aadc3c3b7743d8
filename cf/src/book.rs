//! End-to-end chapter pipeline
//!
//! manifest → chapter orchestration → document assembly → PDF on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::document::{self, DocumentRenderer, DocumentStructure, RenderError};
use crate::generator::SectionGenerator;
use crate::orchestrator::{AggregateMetrics, ChapterOrchestrator, ChapterParams, OrchestratorError};

/// Errors from a book run
#[derive(Debug, Error)]
pub enum BookError {
    #[error("Failed to read book manifest {}: {}", .path.display(), .source)]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse book manifest {}: {}", .path.display(), .source)]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid book manifest: {0}")]
    InvalidManifest(String),

    #[error(transparent)]
    Generation(#[from] OrchestratorError),

    #[error(transparent)]
    Rendering(#[from] RenderError),
}

/// What to write: cover and ordered chapter prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookManifest {
    /// Cover title text
    #[serde(rename = "cover-text")]
    pub cover_text: String,

    /// Optional cover image
    #[serde(rename = "cover-image", default)]
    pub cover_image: Option<PathBuf>,

    /// Shared system context; each chapter's prompt is used when absent
    #[serde(rename = "system-context", default)]
    pub system_context: Option<String>,

    /// Output path override
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Chapter prompts in book order
    pub chapters: Vec<String>,
}

impl BookManifest {
    pub fn load(path: &Path) -> Result<Self, BookError> {
        debug!(?path, "BookManifest::load: called");
        let content = fs::read_to_string(path).map_err(|source| BookError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Self = serde_yaml::from_str(&content).map_err(|source| BookError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
        manifest.validate()?;
        info!(path = %path.display(), chapters = manifest.chapters.len(), "Loaded book manifest");
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), BookError> {
        if self.cover_text.trim().is_empty() {
            return Err(BookError::InvalidManifest("cover-text must not be empty".to_string()));
        }
        if self.chapters.is_empty() {
            return Err(BookError::InvalidManifest("at least one chapter prompt is required".to_string()));
        }
        if let Some(i) = self.chapters.iter().position(|p| p.trim().is_empty()) {
            return Err(BookError::InvalidManifest(format!("chapter {} has an empty prompt", i + 1)));
        }
        Ok(())
    }
}

/// Summary of a finished book
#[derive(Debug, Clone)]
pub struct BookReport {
    pub output: PathBuf,
    pub chapters: usize,
    pub metrics: AggregateMetrics,
}

/// Generate every chapter and assemble the document, without writing it
pub async fn generate_document(
    generator: SectionGenerator,
    config: &Config,
    manifest: &BookManifest,
) -> Result<(DocumentStructure, AggregateMetrics), BookError> {
    debug!(chapters = manifest.chapters.len(), "generate_document: called");
    let params = ChapterParams {
        system_context: manifest.system_context.clone(),
        max_tokens: config.generation.max_tokens,
        temperature: config.generation.temperature,
        words_per_page: config.book.words_per_page,
    };

    let run = ChapterOrchestrator::new(generator, params)
        .run(&manifest.chapters)
        .await?;
    info!(
        total_words = run.metrics.total_words,
        total_pages = run.metrics.total_pages,
        "Final word count"
    );

    let document = document::assemble(
        run.sections.iter().map(|s| s.text()),
        &manifest.cover_text,
        manifest.cover_image.as_deref(),
    );
    Ok((document, run.metrics))
}

/// Run the whole pipeline and write the PDF
///
/// The renderer is checked before the first chapter so a missing font or
/// broken cover costs no endpoint calls. The output file is written once, at
/// the end, and only if every chapter generated and the document rendered.
pub async fn run_book(
    generator: SectionGenerator,
    renderer: &dyn DocumentRenderer,
    config: &Config,
    manifest: &BookManifest,
) -> Result<BookReport, BookError> {
    let output = manifest.output.clone().unwrap_or_else(|| config.book.output.clone());
    debug!(?output, "run_book: called");

    renderer.preflight(manifest.cover_image.as_deref())?;
    let (document, metrics) = generate_document(generator, config, manifest).await?;
    document::render_to_file(renderer, &document, &output)?;

    Ok(BookReport {
        output,
        chapters: manifest.chapters.len(),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Page;
    use crate::generator::RetryPolicy;
    use crate::llm::client::mock::MockLlmClient;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StubRenderer;

    impl DocumentRenderer for StubRenderer {
        fn render(&self, document: &DocumentStructure) -> Result<Vec<u8>, RenderError> {
            Ok(format!("pages={}", document.pages().len()).into_bytes())
        }
    }

    fn generator(client: MockLlmClient) -> SectionGenerator {
        SectionGenerator::new(
            Arc::new(client),
            RetryPolicy {
                max_retries: 1,
                backoff: Duration::ZERO,
            },
        )
    }

    fn manifest(chapters: &[&str]) -> BookManifest {
        BookManifest {
            cover_text: "Unlocking Your Potential".to_string(),
            cover_image: None,
            system_context: None,
            output: None,
            chapters: chapters.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_manifest() {
        let yaml = r#"
cover-text: "Unlocking Your Potential: The Science of Self-Growth"
cover-image: cover_page.png
chapters:
  - Provide an in-depth introduction to motivation.
  - Explain the concept of willpower.
"#;
        let manifest: BookManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.chapters.len(), 2);
        assert_eq!(manifest.cover_image, Some(PathBuf::from("cover_page.png")));
        assert!(manifest.system_context.is_none());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_manifest_validation() {
        assert!(matches!(manifest(&[]).validate(), Err(BookError::InvalidManifest(_))));
        assert!(manifest(&["ok", "  "]).validate().unwrap_err().to_string().contains("chapter 2"));

        let mut m = manifest(&["ok"]);
        m.cover_text = String::new();
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_load_missing_manifest() {
        let err = BookManifest::load(Path::new("/nonexistent/book.yml")).unwrap_err();
        assert!(matches!(err, BookError::ManifestRead { .. }));
    }

    #[tokio::test]
    async fn test_end_to_end_document() {
        let client = MockLlmClient::texts(["Title1\nBody1a\nBody1b", "Title2\nBody2a"]);
        let (doc, metrics) = generate_document(generator(client), &Config::default(), &manifest(&["A", "B"]))
            .await
            .unwrap();

        let pages = doc.pages();
        assert_eq!(pages.len(), 3);
        assert!(matches!(pages[0], Page::Cover(_)));

        let chapters: Vec<_> = doc.chapters().collect();
        assert_eq!(chapters[0].title, "Chapter 1: Title1");
        assert_eq!(chapters[0].body.len(), 2);
        assert_eq!(chapters[1].title, "Chapter 2: Title2");
        assert_eq!(chapters[1].body.len(), 1);
        assert_eq!(metrics.total_words, 5);
    }

    #[tokio::test]
    async fn test_run_book_writes_output() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.book.output = temp.path().join("book.pdf");

        let client = MockLlmClient::texts(["One\nbody", "Two\nbody"]);
        let report = run_book(generator(client), &StubRenderer, &config, &manifest(&["A", "B"]))
            .await
            .unwrap();

        assert_eq!(report.output, config.book.output);
        assert_eq!(report.chapters, 2);
        assert_eq!(fs::read_to_string(&report.output).unwrap(), "pages=3");
    }

    #[tokio::test]
    async fn test_generation_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.book.output = temp.path().join("book.pdf");

        let client = MockLlmClient::texts(["Only one chapter"]);
        let err = run_book(generator(client), &StubRenderer, &config, &manifest(&["A", "B"]))
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::Generation(OrchestratorError::ChapterFailed { index: 1, .. })));
        assert!(!config.book.output.exists());
    }

    struct BrokenRenderer;

    impl DocumentRenderer for BrokenRenderer {
        fn preflight(&self, _cover_image: Option<&Path>) -> Result<(), RenderError> {
            Err(RenderError::Font {
                family: "Missing".to_string(),
                dir: PathBuf::from("/no/fonts"),
                message: "not found".to_string(),
            })
        }

        fn render(&self, _document: &DocumentStructure) -> Result<Vec<u8>, RenderError> {
            unreachable!("render after failed preflight")
        }
    }

    #[tokio::test]
    async fn test_renderer_checked_before_generation() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.book.output = temp.path().join("book.pdf");

        let client = Arc::new(MockLlmClient::texts(["One\nbody"]));
        let generator = SectionGenerator::new(
            client.clone(),
            RetryPolicy {
                max_retries: 1,
                backoff: Duration::ZERO,
            },
        );
        let err = run_book(generator, &BrokenRenderer, &config, &manifest(&["A"]))
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::Rendering(RenderError::Font { .. })));
        assert_eq!(client.call_count(), 0);
        assert!(!config.book.output.exists());
    }

    #[tokio::test]
    async fn test_manifest_output_overrides_config() {
        let temp = TempDir::new().unwrap();
        let mut m = manifest(&["A"]);
        m.output = Some(temp.path().join("custom.pdf"));

        let report = run_book(generator(MockLlmClient::texts(["T"])), &StubRenderer, &Config::default(), &m)
            .await
            .unwrap();
        assert_eq!(report.output, temp.path().join("custom.pdf"));
        assert!(report.output.exists());
    }
}
