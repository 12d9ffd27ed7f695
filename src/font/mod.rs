//! # Fonts
//!
//! Every report is set in the two standard Helvetica faces. Viewers ship
//! them, so nothing is embedded; the PDF only names the face and declares
//! WinAnsi encoding. Widths come from the AFM tables in [`metrics`].

pub mod metrics;

pub use metrics::StandardFontMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// BaseFont name in the font dictionary.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica => metrics::HELVETICA,
            Self::HelveticaBold => metrics::HELVETICA_BOLD,
        }
    }
}

/// Measures text for layout. Passed around by reference so the page
/// writer and the wrapper agree on widths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    pub fn char_width(&self, ch: char, font: StandardFont, font_size: f64) -> f64 {
        font.metrics().char_width(ch, font_size)
    }

    /// Advance of `text` on one line, in points.
    pub fn measure_string(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        font.metrics().measure_string(text, font_size, 0.0)
    }
}
