//! Fixed document styling

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Cover image size in inches (width, height)
pub const COVER_IMAGE_INCHES: (f64, f64) = (6.0, 9.0);

/// Page margin in millimetres
pub const PAGE_MARGIN_MM: i32 = 18;

/// Vertical spacer after titles and body paragraphs, in lines
pub const SPACER_LINES: f64 = 1.0;

/// Text style for one kind of block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: u8,
    /// Line height as a multiple of the font size
    pub line_spacing: f64,
    pub bold: bool,
    pub centered: bool,
    pub color: Option<(u8, u8, u8)>,
}

/// Large centered cover title
pub const COVER: TextStyle = TextStyle {
    font_size: 30,
    line_spacing: 1.2,
    bold: true,
    centered: true,
    color: None,
};

/// Chapter heading in the accent color (#0033A0)
pub const CHAPTER_TITLE: TextStyle = TextStyle {
    font_size: 20,
    line_spacing: 1.2,
    bold: true,
    centered: false,
    color: Some((0x00, 0x33, 0xA0)),
};

/// Standard reading text
pub const BODY: TextStyle = TextStyle {
    font_size: 12,
    line_spacing: 1.5,
    bold: false,
    centered: false,
    color: None,
};

impl TextStyle {
    pub fn to_pdf_style(&self) -> genpdf::style::Style {
        let mut style = genpdf::style::Style::new()
            .with_font_size(self.font_size)
            .with_line_spacing(self.line_spacing);
        if let Some((r, g, b)) = self.color {
            style = style.with_color(genpdf::style::Color::Rgb(r, g, b));
        }
        if self.bold {
            style = style.bold();
        }
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_are_distinct() {
        assert!(COVER.font_size > CHAPTER_TITLE.font_size);
        assert!(CHAPTER_TITLE.font_size > BODY.font_size);
        assert!(COVER.centered);
        assert_eq!(CHAPTER_TITLE.color, Some((0x00, 0x33, 0xA0)));
    }

    #[test]
    fn test_cover_fits_on_a4() {
        let (w, h) = COVER_IMAGE_INCHES;
        let margins = 2.0 * PAGE_MARGIN_MM as f64;
        assert!(w * MM_PER_INCH <= 210.0 - margins);
        assert!(h * MM_PER_INCH <= 297.0 - margins);
    }
}
