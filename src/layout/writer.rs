//! # Page Writer
//!
//! The document cursor. Owns the page being filled, the vertical offset on
//! it and the page-scoped graphics state. Primitives measure themselves,
//! call [`PageWriter::ensure_space`], draw at [`PageWriter::y`] and then
//! [`PageWriter::advance`].

use tracing::debug;

use super::page_break::{BreakDecision, BreakPolicy};
use super::{mm, DrawCommand, LayoutElement, LayoutPage, Stroke, TextLine};
use crate::font::FontContext;
use crate::image_loader::LoadedImage;
use crate::style::{Color, TextStyle};
use crate::text::{BrokenLine, TextLayout};

/// A4 width in points.
pub const A4_WIDTH: f64 = 595.28;
/// A4 height in points.
pub const A4_HEIGHT: f64 = 841.89;

/// Baseline position inside a line box, as a fraction of the font size.
const ASCENT: f64 = 0.78;

/// Page size and margins, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
}

impl PageGeometry {
    /// A4 portrait with the same margin on every side.
    pub fn a4(margin_mm: f64) -> Self {
        let m = mm(margin_mm);
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin_top: m,
            margin_right: m,
            margin_bottom: m,
            margin_left: m,
        }
    }

    pub fn content_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn content_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4(15.0)
    }
}

/// How a rectangle is painted with the current graphics state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Fill,
    Stroke,
    FillStroke,
}

/// Page-scoped drawing state. Reset on every new page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsState {
    pub stroke: Stroke,
    pub fill: Color,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            stroke: Stroke::default(),
            fill: Color::BLACK,
        }
    }
}

pub struct PageWriter {
    geometry: PageGeometry,
    policy: BreakPolicy,
    fonts: FontContext,
    text: TextLayout,
    pages: Vec<LayoutPage>,
    elements: Vec<LayoutElement>,
    y: f64,
    state: GraphicsState,
}

impl PageWriter {
    /// Open a writer with one blank page and the cursor at the top margin.
    pub fn new(geometry: PageGeometry, policy: BreakPolicy) -> Self {
        Self {
            geometry,
            policy,
            fonts: FontContext::new(),
            text: TextLayout::new(),
            pages: Vec::new(),
            elements: Vec::new(),
            y: geometry.margin_top,
            state: GraphicsState::default(),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn policy(&self) -> BreakPolicy {
        self.policy
    }

    /// Batch renders switch policy per record on the shared writer.
    pub fn set_policy(&mut self, policy: BreakPolicy) {
        self.policy = policy;
    }

    /// Current vertical offset from the top of the page.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Zero-based index of the page being filled.
    pub fn page_index(&self) -> usize {
        self.pages.len()
    }

    pub fn content_x(&self) -> f64 {
        self.geometry.margin_left
    }

    pub fn content_width(&self) -> f64 {
        self.geometry.content_width()
    }

    /// The lowest y content may reach under the current policy.
    pub fn bottom_limit(&self) -> f64 {
        self.policy
            .limit(self.geometry.height, self.geometry.margin_bottom)
    }

    pub fn remaining(&self) -> f64 {
        (self.bottom_limit() - self.y).max(0.0)
    }

    fn at_page_top(&self) -> bool {
        self.y <= self.geometry.margin_top + 1e-6
    }

    /// Break to a new page if `required` points would cross the bottom limit.
    ///
    /// Returns whether a break happened.
    pub fn ensure_space(&mut self, required: f64) -> bool {
        let decision = self.policy.decide(
            self.y,
            required,
            self.geometry.height,
            self.geometry.margin_bottom,
            self.at_page_top(),
        );
        match decision {
            BreakDecision::Place => false,
            BreakDecision::MoveToNextPage => {
                debug!(
                    page = self.page_index(),
                    y = self.y,
                    required,
                    limit = self.bottom_limit(),
                    "page break"
                );
                self.new_page();
                true
            }
        }
    }

    /// Move the cursor down. Negative heights are ignored.
    pub fn advance(&mut self, height: f64) {
        if height > 0.0 {
            self.y += height;
        }
    }

    /// Commit the current page and open a blank one.
    pub fn new_page(&mut self) {
        let elements = std::mem::take(&mut self.elements);
        self.pages.push(LayoutPage {
            width: self.geometry.width,
            height: self.geometry.height,
            elements,
        });
        self.y = self.geometry.margin_top;
        self.state = GraphicsState::default();
    }

    /// Commit the last page and hand back every page in order.
    pub fn finish(mut self) -> Vec<LayoutPage> {
        self.new_page();
        self.pages
    }

    // ── Graphics state ─────────────────────────────────────────

    pub fn graphics_state(&self) -> GraphicsState {
        self.state
    }

    pub fn set_stroke(&mut self, color: Color, width: f64) {
        self.state.stroke = Stroke { color, width };
    }

    pub fn set_fill(&mut self, color: Color) {
        self.state.fill = color;
    }

    // ── Measurement ────────────────────────────────────────────

    pub fn measure(&self, text: &str, style: &TextStyle) -> f64 {
        self.text
            .measure_width(&self.fonts, text, style.font, style.size)
    }

    /// Wrap `text` to `max_width`. Always returns at least one line.
    pub fn wrap(&self, text: &str, max_width: f64, style: &TextStyle) -> Vec<BrokenLine> {
        self.text
            .break_into_lines(&self.fonts, text, max_width, style.font, style.size)
    }

    // ── Drawing (never moves the cursor) ───────────────────────

    /// Draw pre-broken lines, one per `line_height`, starting at `top`.
    pub fn text_lines(
        &mut self,
        x: f64,
        top: f64,
        lines: &[BrokenLine],
        style: TextStyle,
        line_height: f64,
    ) {
        let baseline = (line_height - style.size) / 2.0 + style.size * ASCENT;
        let text_lines: Vec<TextLine> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.text.is_empty())
            .map(|(i, line)| TextLine {
                x,
                y: top + i as f64 * line_height + baseline,
                text: line.text.clone(),
                width: line.width,
            })
            .collect();
        if text_lines.is_empty() {
            return;
        }
        let width = text_lines.iter().map(|l| l.width).fold(0.0, f64::max);
        self.elements.push(LayoutElement {
            x,
            y: top,
            width,
            height: lines.len() as f64 * line_height,
            draw: DrawCommand::Text {
                lines: text_lines,
                style,
            },
        });
    }

    /// Draw one unwrapped line of text with its line box at `top`.
    pub fn text(&mut self, x: f64, top: f64, text: &str, style: TextStyle, line_height: f64) {
        let line = BrokenLine {
            text: text.to_string(),
            width: self.measure(text, &style),
        };
        self.text_lines(x, top, &[line], style, line_height);
    }

    /// A line segment in the current stroke.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let stroke = self.state.stroke;
        self.elements.push(LayoutElement {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
            draw: DrawCommand::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
            },
        });
    }

    /// A rectangle painted with the current fill and/or stroke.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, radius: f64, paint: Paint) {
        let background = match paint {
            Paint::Fill | Paint::FillStroke => Some(self.state.fill),
            Paint::Stroke => None,
        };
        let border = match paint {
            Paint::Stroke | Paint::FillStroke => Some(self.state.stroke),
            Paint::Fill => None,
        };
        self.elements.push(LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Rect {
                background,
                border,
                radius: radius.max(0.0).min(width.min(height) / 2.0),
            },
        });
    }

    pub fn image(&mut self, x: f64, y: f64, width: f64, height: f64, image: LoadedImage) {
        self.elements.push(LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Image { image_data: image },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(policy: BreakPolicy) -> PageWriter {
        PageWriter::new(PageGeometry::a4(15.0), policy)
    }

    #[test]
    fn starts_at_top_margin() {
        let w = writer(BreakPolicy::Strict);
        assert!((w.y() - mm(15.0)).abs() < 1e-9);
        assert_eq!(w.page_index(), 0);
    }

    #[test]
    fn breaks_exactly_once_at_first_overflow() {
        let mut w = writer(BreakPolicy::Strict);
        let row = 20.0;
        let mut breaks = Vec::new();
        for i in 0..60 {
            if w.ensure_space(row) {
                breaks.push(i);
                assert!((w.y() - w.geometry().margin_top).abs() < 1e-9);
            }
            w.text(w.content_x(), w.y(), &format!("row {}", i), TextStyle::regular(9.0), row);
            w.advance(row);
            assert!(w.y() <= w.bottom_limit() + 1e-9);
        }
        // 756.85pt of content height holds 37 rows of 20pt
        assert_eq!(breaks, vec![37]);
        let pages = w.finish();
        assert_eq!(pages.len(), 2);
        assert!(pages[1].plain_text().starts_with("row 37"));
    }

    #[test]
    fn lenient_policy_delays_the_break() {
        let geometry = PageGeometry::a4(15.0);
        let y = geometry.height - geometry.margin_bottom - 10.0;

        let mut strict = writer(BreakPolicy::Strict);
        strict.advance(y - strict.y());
        assert!(strict.ensure_space(15.0));

        let mut lenient = writer(BreakPolicy::Lenient { slack: mm(3.0) });
        lenient.advance(y - lenient.y());
        assert!(!lenient.ensure_space(15.0));
        assert!(lenient.ensure_space(25.0));
    }

    #[test]
    fn advance_never_moves_backwards() {
        let mut w = writer(BreakPolicy::Strict);
        let y = w.y();
        w.advance(-50.0);
        assert_eq!(w.y(), y);
        w.advance(12.0);
        assert_eq!(w.y(), y + 12.0);
    }

    #[test]
    fn new_page_resets_graphics_state() {
        let mut w = writer(BreakPolicy::Strict);
        w.set_stroke(Color::rgb(1.0, 0.0, 0.0), 2.0);
        w.set_fill(Color::WHITE);
        w.advance(100.0);
        w.new_page();
        assert_eq!(w.graphics_state(), GraphicsState::default());
        assert!((w.y() - w.geometry().margin_top).abs() < 1e-9);
        assert_eq!(w.page_index(), 1);
    }

    #[test]
    fn line_uses_current_stroke() {
        let mut w = writer(BreakPolicy::Strict);
        w.set_stroke(Color::WHITE, 1.5);
        w.line(10.0, 10.0, 100.0, 10.0);
        let pages = w.finish();
        match &pages[0].elements[0].draw {
            DrawCommand::Line { stroke, .. } => {
                assert_eq!(stroke.color, Color::WHITE);
                assert_eq!(stroke.width, 1.5);
            }
            other => panic!("expected a line, got {:?}", other),
        }
    }

    #[test]
    fn rect_paint_modes() {
        let mut w = writer(BreakPolicy::Strict);
        w.set_fill(Color::WHITE);
        w.rect(0.0, 0.0, 10.0, 10.0, 20.0, Paint::Fill);
        w.rect(0.0, 0.0, 10.0, 10.0, 0.0, Paint::Stroke);
        let pages = w.finish();
        match &pages[0].elements[0].draw {
            DrawCommand::Rect { background, border, radius } => {
                assert_eq!(*background, Some(Color::WHITE));
                assert!(border.is_none());
                assert_eq!(*radius, 5.0, "radius is capped at half the short side");
            }
            other => panic!("expected a rect, got {:?}", other),
        }
        match &pages[0].elements[1].draw {
            DrawCommand::Rect { background, border, .. } => {
                assert!(background.is_none());
                assert!(border.is_some());
            }
            other => panic!("expected a rect, got {:?}", other),
        }
    }

    #[test]
    fn empty_lines_draw_nothing() {
        let mut w = writer(BreakPolicy::Strict);
        w.text(0.0, 0.0, "", TextStyle::regular(9.0), 12.0);
        assert!(w.finish()[0].elements.is_empty());
    }
}
