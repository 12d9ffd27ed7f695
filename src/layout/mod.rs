//! # Page-Aware Layout Engine
//!
//! Reports are laid out INTO pages. There is no infinite canvas that gets
//! sliced afterwards: a [`PageWriter`] owns the current page and a vertical
//! cursor, and every primitive asks "does this fit?" before it draws.
//!
//! 1. Open a page with known dimensions and margins
//! 2. Measure the primitive (wrapped lines, table rows, fixed boxes)
//! 3. `ensure_space(height)`: if it would cross the bottom limit, start a
//!    new page and reset the cursor to the top margin
//! 4. Draw at the cursor, then `advance(height)`
//!
//! The cursor only moves down within a page. The break limit is governed by
//! a [`BreakPolicy`]: strict templates break at the exact bottom margin,
//! lenient ones allow a few millimetres of slack.
//!
//! All coordinates are PDF points with the origin at the top-left corner of
//! the page; the PDF writer flips them.

pub mod page_break;
pub mod primitives;
pub mod table;
pub mod writer;

pub use page_break::BreakPolicy;
pub use primitives::Metrics;
pub use table::TableGrid;
pub use writer::{PageGeometry, PageWriter};

use crate::image_loader::LoadedImage;
use crate::style::{Color, TextStyle};

/// Points per millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// Millimetres to points.
pub fn mm(v: f64) -> f64 {
    v * PT_PER_MM
}

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    /// Every text line on the page, in drawing order.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().flat_map(|el| match &el.draw {
            DrawCommand::Text { lines, .. } => lines.iter().map(|l| l.text.as_str()).collect::<Vec<&str>>(),
            _ => Vec::new(),
        })
    }

    /// Text lines joined with newlines, for assertions and previews.
    pub fn plain_text(&self) -> String {
        self.text_lines().collect::<Vec<_>>().join("\n")
    }

    /// Number of embedded images on the page.
    pub fn image_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|el| matches!(el.draw, DrawCommand::Image { .. }))
            .count()
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Absolute position on the page (top-left corner).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// The visual properties to draw.
    pub draw: DrawCommand,
}

/// Stroke color and line width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 0.5,
        }
    }
}

/// What to actually draw for this element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// One or more lines of text in a single style.
    Text { lines: Vec<TextLine>, style: TextStyle },
    /// A straight line segment, in page coordinates.
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
    /// A rectangle with optional fill, border and rounded corners.
    Rect {
        background: Option<Color>,
        border: Option<Stroke>,
        radius: f64,
    },
    /// A raster image scaled into the element box.
    Image { image_data: LoadedImage },
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub x: f64,
    /// Baseline position from the top of the page.
    pub y: f64,
    pub text: String,
    pub width: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;

    #[test]
    fn mm_conversion() {
        assert!((mm(25.4) - 72.0).abs() < 1e-9);
        assert!((mm(210.0) - 595.2756).abs() < 1e-3);
    }

    #[test]
    fn plain_text_walks_text_elements_only() {
        let page = LayoutPage {
            width: 595.28,
            height: 841.89,
            elements: vec![
                LayoutElement {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                    draw: DrawCommand::Rect {
                        background: Some(Color::WHITE),
                        border: None,
                        radius: 0.0,
                    },
                },
                LayoutElement {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 24.0,
                    draw: DrawCommand::Text {
                        lines: vec![
                            TextLine { x: 0.0, y: 9.0, text: "Line one".into(), width: 30.0 },
                            TextLine { x: 0.0, y: 21.0, text: "Line two".into(), width: 30.0 },
                        ],
                        style: TextStyle::regular(9.0),
                    },
                },
            ],
        };
        assert_eq!(page.plain_text(), "Line one\nLine two");
        assert_eq!(page.image_count(), 0);
    }
}
