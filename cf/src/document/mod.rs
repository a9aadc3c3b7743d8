//! Book document structure
//!
//! Generated chapter texts become a list of pages: a cover followed by one
//! page per chapter. Every page ends with a page break. Body lines map
//! one-to-one onto paragraphs; nothing is re-wrapped or merged.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

mod render;
pub mod style;

pub use render::{DocumentRenderer, PdfRenderer, RenderError, render_to_file};

use crate::text::clean_generated_text;

/// Cover page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cover {
    /// Image scaled to the fixed cover size
    Image(PathBuf),
    /// Large centered title text
    Text(String),
}

/// One chapter: synthesized title plus one paragraph per body line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterPage {
    pub title: String,
    pub body: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Cover(Cover),
    Chapter(ChapterPage),
}

/// Flattened layout unit consumed by renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    CoverImage(&'a Path),
    CoverText(&'a str),
    Title(&'a str),
    Paragraph(&'a str),
    Spacer,
    PageBreak,
}

/// Ordered pages of a book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStructure {
    title: String,
    pages: Vec<Page>,
}

impl DocumentStructure {
    /// Document title (the cover text)
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn chapters(&self) -> impl Iterator<Item = &ChapterPage> {
        self.pages.iter().filter_map(|page| match page {
            Page::Chapter(chapter) => Some(chapter),
            Page::Cover(_) => None,
        })
    }

    /// Layout blocks in render order
    ///
    /// Titles and body paragraphs are each followed by a spacer; every page
    /// is terminated by a page break.
    pub fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks = Vec::new();
        for page in &self.pages {
            match page {
                Page::Cover(Cover::Image(path)) => blocks.push(Block::CoverImage(path)),
                Page::Cover(Cover::Text(text)) => blocks.push(Block::CoverText(text)),
                Page::Chapter(chapter) => {
                    blocks.push(Block::Title(&chapter.title));
                    blocks.push(Block::Spacer);
                    for line in &chapter.body {
                        blocks.push(Block::Paragraph(line));
                        blocks.push(Block::Spacer);
                    }
                }
            }
            blocks.push(Block::PageBreak);
        }
        blocks
    }
}

/// Split one chapter's text into its page
///
/// The title is `Chapter {index+1}: {first line}`; the body is every line
/// after the first.
pub fn chapter_page(index: usize, text: &str) -> ChapterPage {
    let cleaned = clean_generated_text(text);
    let mut lines = cleaned.lines();
    let heading = lines.next().unwrap_or_default();
    ChapterPage {
        title: format!("Chapter {}: {}", index + 1, heading),
        body: lines.map(str::to_string).collect(),
    }
}

/// Build the document for a book
///
/// `chapters` may be cleaned section texts or raw endpoint output; cleanup is
/// applied either way. The cover uses the image when `cover_image` points at
/// an existing file, otherwise the cover text.
pub fn assemble<I, S>(chapters: I, cover_text: &str, cover_image: Option<&Path>) -> DocumentStructure
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    debug!(%cover_text, ?cover_image, "assemble: called");
    let cover = match cover_image {
        Some(path) if path.exists() => Cover::Image(path.to_path_buf()),
        Some(path) => {
            warn!(path = %path.display(), "Cover image not found, using cover text");
            Cover::Text(cover_text.to_string())
        }
        None => Cover::Text(cover_text.to_string()),
    };

    let mut pages = vec![Page::Cover(cover)];
    pages.extend(
        chapters
            .into_iter()
            .enumerate()
            .map(|(index, text)| Page::Chapter(chapter_page(index, text.as_ref()))),
    );

    debug!(page_count = pages.len(), "assemble: done");
    DocumentStructure {
        title: cover_text.to_string(),
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_extraction() {
        let page = chapter_page(2, "Intro\nLine A\nLine B");
        assert_eq!(page.title, "Chapter 3: Intro");
        assert_eq!(page.body, vec!["Line A", "Line B"]);
    }

    #[test]
    fn test_raw_text_is_cleaned_before_split() {
        let page = chapter_page(0, "assistant\n\nHabits\nBody line");
        assert_eq!(page.title, "Chapter 1: Habits");
        assert_eq!(page.body, vec!["Body line"]);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        let page = chapter_page(0, "Title\nFirst\n\nSecond");
        assert_eq!(page.body, vec!["First", "", "Second"]);
    }

    #[test]
    fn test_title_only_chapter_has_empty_body() {
        let page = chapter_page(4, "Special Thanks");
        assert_eq!(page.title, "Chapter 5: Special Thanks");
        assert!(page.body.is_empty());
    }

    #[test]
    fn test_text_cover_when_no_image() {
        let doc = assemble(["T\nB"], "My Book", None);
        assert_eq!(doc.title(), "My Book");
        assert_eq!(doc.pages()[0], Page::Cover(Cover::Text("My Book".to_string())));
    }

    #[test]
    fn test_missing_image_falls_back_to_text() {
        let doc = assemble(["T"], "My Book", Some(Path::new("/nonexistent/cover.png")));
        assert_eq!(doc.pages()[0], Page::Cover(Cover::Text("My Book".to_string())));
    }

    #[test]
    fn test_existing_image_is_used() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let doc = assemble(["T"], "My Book", Some(temp.path()));
        assert_eq!(doc.pages()[0], Page::Cover(Cover::Image(temp.path().to_path_buf())));
        assert_eq!(doc.blocks()[0], Block::CoverImage(temp.path()));
    }

    #[test]
    fn test_blocks_layout() {
        let doc = assemble(["Title1\nBody1a\nBody1b", "Title2\nBody2a"], "Cover", None);

        assert_eq!(
            doc.blocks(),
            vec![
                Block::CoverText("Cover"),
                Block::PageBreak,
                Block::Title("Chapter 1: Title1"),
                Block::Spacer,
                Block::Paragraph("Body1a"),
                Block::Spacer,
                Block::Paragraph("Body1b"),
                Block::Spacer,
                Block::PageBreak,
                Block::Title("Chapter 2: Title2"),
                Block::Spacer,
                Block::Paragraph("Body2a"),
                Block::Spacer,
                Block::PageBreak,
            ]
        );
    }
}
