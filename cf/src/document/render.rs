//! PDF rendering of a [`DocumentStructure`]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use genpdf::elements::{self, Paragraph, StyledElement};
use genpdf::{Alignment, Element, Scale};
use thiserror::Error;
use tracing::{debug, info};

use super::style::{self, TextStyle};
use super::{Block, DocumentStructure};
use crate::persist::write_atomically;

/// Resolution genpdf assumes for images
const IMAGE_DPI: f64 = 300.0;

/// Errors while producing the output document
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to load font family '{}' from {}: {}", .family, .dir.display(), .message)]
    Font {
        family: String,
        dir: PathBuf,
        message: String,
    },

    #[error("Failed to load cover image {}: {}", .path.display(), .message)]
    Image { path: PathBuf, message: String },

    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] genpdf::error::Error),

    #[error("Failed to write {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a document structure into output bytes
pub trait DocumentRenderer {
    /// Check that every resource the renderer needs can be loaded
    ///
    /// Runs before any content is generated, so a broken setup fails fast.
    fn preflight(&self, cover_image: Option<&Path>) -> Result<(), RenderError> {
        let _ = cover_image;
        Ok(())
    }

    /// Render the complete document in memory
    fn render(&self, document: &DocumentStructure) -> Result<Vec<u8>, RenderError>;
}

/// Render and write the document, or leave `output` untouched on failure
pub fn render_to_file(
    renderer: &dyn DocumentRenderer,
    document: &DocumentStructure,
    output: &Path,
) -> Result<(), RenderError> {
    debug!(?output, "render_to_file: called");
    let bytes = renderer.render(document)?;
    write_atomically(output, &bytes).map_err(|source| RenderError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    info!(path = %output.display(), bytes = bytes.len(), "PDF created successfully");
    Ok(())
}

/// A4 PDF renderer using a TrueType font family from disk
pub struct PdfRenderer {
    font_dir: PathBuf,
    font_family: String,
}

impl PdfRenderer {
    pub fn new(font_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            font_dir: font_dir.into(),
            font_family: font_family.into(),
        }
    }

    fn paragraph(text: &str, style: &TextStyle) -> StyledElement<Paragraph> {
        let mut paragraph = Paragraph::new(text.to_string());
        if style.centered {
            paragraph = paragraph.aligned(Alignment::Center);
        }
        paragraph.styled(style.to_pdf_style())
    }

    fn font_family(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, RenderError> {
        genpdf::fonts::from_files(&self.font_dir, &self.font_family, None).map_err(|e| RenderError::Font {
            family: self.font_family.clone(),
            dir: self.font_dir.clone(),
            message: e.to_string(),
        })
    }

    /// Cover image scaled to the fixed cover size regardless of pixel dimensions
    ///
    /// The PDF backend rejects alpha channels, so every image is flattened to
    /// 8-bit RGB and handed over as an in-memory PNG.
    fn cover_image(path: &Path) -> Result<elements::Image, RenderError> {
        debug!(?path, "cover_image: called");
        let image_error = |message: String| RenderError::Image {
            path: path.to_path_buf(),
            message,
        };

        let rgb = image::open(path).map_err(|e| image_error(e.to_string()))?.to_rgb8();
        let (px_w, px_h) = rgb.dimensions();
        if px_w == 0 || px_h == 0 {
            return Err(image_error("image has zero size".to_string()));
        }

        let mut png = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(rgb)
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| image_error(e.to_string()))?;
        png.set_position(0);
        let image = elements::Image::from_reader(png).map_err(|e| image_error(e.to_string()))?;

        let natural_mm = |px: u32| px as f64 * style::MM_PER_INCH / IMAGE_DPI;
        let (target_w, target_h) = style::COVER_IMAGE_INCHES;
        let scale = Scale::new(
            target_w * style::MM_PER_INCH / natural_mm(px_w),
            target_h * style::MM_PER_INCH / natural_mm(px_h),
        );

        Ok(image
            .with_dpi(IMAGE_DPI)
            .with_alignment(Alignment::Center)
            .with_scale(scale))
    }
}

impl DocumentRenderer for PdfRenderer {
    fn preflight(&self, cover_image: Option<&Path>) -> Result<(), RenderError> {
        debug!(?cover_image, "PdfRenderer::preflight: called");
        self.font_family()?;
        if let Some(path) = cover_image.filter(|p| p.exists()) {
            Self::cover_image(path)?;
        }
        Ok(())
    }

    fn render(&self, document: &DocumentStructure) -> Result<Vec<u8>, RenderError> {
        debug!(pages = document.pages().len(), "PdfRenderer::render: called");
        let family = self.font_family()?;

        let mut doc = genpdf::Document::new(family);
        doc.set_title(document.title());
        doc.set_paper_size(genpdf::PaperSize::A4);
        doc.set_font_size(style::BODY.font_size);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(style::PAGE_MARGIN_MM);
        doc.set_page_decorator(decorator);

        for block in document.blocks() {
            match block {
                Block::CoverImage(path) => doc.push(Self::cover_image(path)?),
                Block::CoverText(text) => doc.push(Self::paragraph(text, &style::COVER)),
                Block::Title(text) => doc.push(Self::paragraph(text, &style::CHAPTER_TITLE)),
                Block::Paragraph(text) => doc.push(Self::paragraph(text, &style::BODY)),
                Block::Spacer => doc.push(elements::Break::new(style::SPACER_LINES)),
                Block::PageBreak => doc.push(elements::PageBreak::new()),
            }
        }

        let mut bytes = Vec::new();
        doc.render(&mut bytes)?;
        debug!(len = bytes.len(), "PdfRenderer::render: done");
        Ok(bytes)
    }
}
