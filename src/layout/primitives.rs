//! # Layout Primitives
//!
//! The building blocks every report template is composed from. Each one
//! measures its content first, asks the writer for space, draws at the
//! cursor and then advances by exactly the height it measured.

use super::table::TableGrid;
use super::writer::{PageWriter, Paint};
use crate::image_loader::LoadedImage;
use crate::style::{Color, Palette, TextStyle};
use crate::text::BrokenLine;

/// Sizes and colors shared by all primitives of one template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub body_size: f64,
    pub line_height: f64,
    /// Extra space below every field row.
    pub row_padding: f64,
    /// Minimum width reserved for `"Label: "` so values align.
    pub label_min_width: f64,
    /// Space between side-by-side bands.
    pub gutter: f64,
    pub section_size: f64,
    pub section_gap_before: f64,
    pub section_gap_after: f64,
    pub sub_size: f64,
    /// Left indent of paragraph bodies.
    pub indent: f64,
    pub badge_height: f64,
    pub cell_padding: f64,
    pub accent: Color,
    pub ink: Color,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::with_palette(&Palette::default())
    }
}

impl Metrics {
    pub fn with_palette(palette: &Palette) -> Self {
        Self {
            body_size: 9.0,
            line_height: 12.0,
            row_padding: 1.5,
            label_min_width: 90.0,
            gutter: 14.0,
            section_size: 11.0,
            section_gap_before: 7.0,
            section_gap_after: 5.0,
            sub_size: 9.5,
            indent: 10.0,
            badge_height: 24.0,
            cell_padding: 3.0,
            accent: palette.primary(),
            ink: palette.secondary(),
        }
    }

    pub fn body(&self) -> TextStyle {
        TextStyle::regular(self.body_size).with_color(self.ink)
    }

    pub fn label(&self) -> TextStyle {
        TextStyle::bold(self.body_size).with_color(self.ink)
    }

    /// Height of the section title line.
    pub fn section_line(&self) -> f64 {
        self.section_size + 4.0
    }

    /// Total height a section header occupies.
    pub fn section_height(&self) -> f64 {
        self.section_gap_before + self.section_line() + 2.0 + self.section_gap_after
    }

    /// One field row.
    pub fn row_height(&self) -> f64 {
        self.line_height + self.row_padding
    }
}

/// Horizontal alignment inside a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A measured `"Label: value"` block.
#[derive(Debug, Clone)]
pub struct KeyValueBlock {
    pub label: String,
    /// Width reserved for the label column.
    pub label_width: f64,
    pub lines: Vec<BrokenLine>,
}

impl KeyValueBlock {
    pub fn line_count(&self) -> usize {
        self.lines.len().max(1)
    }
}

/// Measure a key-value pair laid out in a band of `width` points.
pub fn measure_key_value(
    w: &PageWriter,
    m: &Metrics,
    label: &str,
    value: &str,
    width: f64,
    wrap: bool,
) -> KeyValueBlock {
    let mut label = format!("{}: ", label);
    let measured = w.measure(&label, &m.label());
    let cap = width * 0.6;
    let label_width = if measured <= m.label_min_width {
        m.label_min_width
    } else {
        (measured + 2.0).min(cap)
    };
    // Labels past the cap are cut short so they never run into the value.
    if measured > m.label_min_width && measured + 2.0 > cap {
        let suffix = w.measure(": ", &m.label());
        let stem = label.trim_end_matches(": ");
        let cut = truncate_to_width(w, stem, label_width - 2.0 - suffix, &m.label());
        label = format!("{}: ", cut.text);
    }
    let value_width = (width - label_width).max(1.0);
    let lines = if wrap {
        w.wrap(value, value_width, &m.body())
    } else {
        vec![truncate_to_width(w, value, value_width, &m.body())]
    };
    KeyValueBlock {
        label,
        label_width,
        lines,
    }
}

/// Draw a measured block with its first line at `top`. Does not advance.
pub fn draw_key_value(w: &mut PageWriter, m: &Metrics, x: f64, top: f64, block: &KeyValueBlock) {
    w.text(x, top, &block.label, m.label(), m.line_height);
    w.text_lines(x + block.label_width, top, &block.lines, m.body(), m.line_height);
}

/// A full-width key-value line.
pub fn key_value(w: &mut PageWriter, m: &Metrics, label: &str, value: &str, wrap: bool) {
    let block = measure_key_value(w, m, label, value, w.content_width(), wrap);
    let height = block.line_count() as f64 * m.line_height + m.row_padding;
    w.ensure_space(height);
    let (x, top) = (w.content_x(), w.y());
    draw_key_value(w, m, x, top, &block);
    w.advance(height);
}

/// One cell of a multi-band row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub label: String,
    pub value: String,
    pub wrap: bool,
}

impl Cell {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            wrap: true,
        }
    }
}

/// Width of one of `n` equal bands across the content width.
pub fn band_width(w: &PageWriter, m: &Metrics, n: usize) -> f64 {
    let n = n.max(1) as f64;
    (w.content_width() - m.gutter * (n - 1.0)) / n
}

/// Key-value cells side by side in `bands` equal bands, all starting at
/// the same `y`. Advances by the tallest cell.
pub fn columns(w: &mut PageWriter, m: &Metrics, cells: &[Cell], bands: usize) {
    columns_from(w, m, cells, 0, bands);
}

/// Like [`columns`], with the first cell placed in band `first_band`.
pub fn columns_from(w: &mut PageWriter, m: &Metrics, cells: &[Cell], first_band: usize, bands: usize) {
    if cells.is_empty() {
        return;
    }
    let bands = bands.max(first_band + cells.len());
    let width = band_width(w, m, bands);
    let blocks: Vec<KeyValueBlock> = cells
        .iter()
        .map(|c| measure_key_value(w, m, &c.label, &c.value, width, c.wrap))
        .collect();
    let max_lines = blocks.iter().map(KeyValueBlock::line_count).max().unwrap_or(1);
    let height = max_lines as f64 * m.line_height + m.row_padding;

    w.ensure_space(height);
    let top = w.y();
    for (i, block) in blocks.iter().enumerate() {
        let x = w.content_x() + (first_band + i) as f64 * (width + m.gutter);
        draw_key_value(w, m, x, top, block);
    }
    w.advance(height);
}

/// Left and right key-value pairs in two bands.
pub fn two_column(w: &mut PageWriter, m: &Metrics, left: Cell, right: Cell) {
    columns(w, m, &[left, right], 2);
}

/// Upper-cased bold title in the accent color over a full-width rule.
///
/// Reserves room for the header plus one row so a title never ends a page.
pub fn section_header(w: &mut PageWriter, m: &Metrics, title: &str) {
    w.ensure_space(m.section_height() + m.row_height());
    if w.y() > w.geometry().margin_top + 1e-6 {
        w.advance(m.section_gap_before);
    }
    let style = TextStyle::bold(m.section_size).with_color(m.accent);
    let (x, top) = (w.content_x(), w.y());
    w.text(x, top, &title.to_uppercase(), style, m.section_line());
    w.advance(m.section_line() + 1.0);

    w.set_stroke(m.accent, 0.75);
    let y = w.y();
    w.line(x, y, x + w.content_width(), y);
    w.advance(1.0 + m.section_gap_after);
}

/// A smaller bold title without a rule.
pub fn sub_header(w: &mut PageWriter, m: &Metrics, title: &str) {
    let height = m.line_height + 2.0;
    w.ensure_space(height + m.row_height());
    w.advance(2.0);
    let style = TextStyle::bold(m.sub_size).with_color(m.ink);
    let (x, top) = (w.content_x(), w.y());
    w.text(x, top, title, style, m.line_height);
    w.advance(m.line_height);
}

/// Optional bold label, then the body wrapped and indented. An empty body
/// still takes one blank line. Long bodies continue on the next page.
pub fn paragraph(w: &mut PageWriter, m: &Metrics, label: Option<&str>, body: &str) {
    if let Some(label) = label {
        w.ensure_space(m.line_height * 2.0);
        let (x, top) = (w.content_x(), w.y());
        w.text(x, top, label, m.label(), m.line_height);
        w.advance(m.line_height);
    }
    if body.trim().is_empty() {
        w.ensure_space(m.line_height);
        w.advance(m.line_height);
    } else {
        let x = w.content_x() + m.indent;
        let lines = w.wrap(body.trim(), w.content_width() - m.indent, &m.body());
        for line in lines {
            w.ensure_space(m.line_height);
            let top = w.y();
            w.text_lines(x, top, std::slice::from_ref(&line), m.body(), m.line_height);
            w.advance(m.line_height);
        }
    }
    w.advance(m.row_padding);
}

/// A single line aligned inside the content width.
pub fn aligned_line(w: &mut PageWriter, text: &str, style: TextStyle, line_height: f64, align: Align) {
    w.ensure_space(line_height);
    let x = aligned_x(w, w.content_x(), w.content_width(), text, &style, align);
    let top = w.y();
    w.text(x, top, text, style, line_height);
    w.advance(line_height);
}

/// X position of `text` aligned in the band `[x, x + width]`.
pub fn aligned_x(w: &PageWriter, x: f64, width: f64, text: &str, style: &TextStyle, align: Align) -> f64 {
    let text_width = w.measure(text, style);
    match align {
        Align::Left => x,
        Align::Center => x + ((width - text_width) / 2.0).max(0.0),
        Align::Right => x + (width - text_width).max(0.0),
    }
}

/// Full-width rule at the cursor.
pub fn rule(w: &mut PageWriter, color: Color, width: f64, gap_after: f64) {
    w.set_stroke(color, width);
    let (x, y) = (w.content_x(), w.y());
    w.line(x, y, x + w.content_width(), y);
    w.advance(gap_after);
}

/// Full-width rounded box with a tinted fill and two status strings.
pub fn badge(w: &mut PageWriter, m: &Metrics, left: &str, right: &str, color: Color) {
    let height = m.badge_height;
    w.ensure_space(height + m.row_padding);
    let (x, top, width) = (w.content_x(), w.y(), w.content_width());

    w.set_fill(color.tint(0.88));
    w.set_stroke(color, 0.8);
    w.rect(x, top, width, height, 4.0, Paint::FillStroke);

    let style = TextStyle::bold(m.body_size + 1.0).with_color(color);
    let text_top = top + (height - m.line_height) / 2.0;
    let half = width / 2.0;
    w.text(x + 10.0, text_top, left, style, m.line_height);
    w.text(x + half + 10.0, text_top, right, style, m.line_height);
    w.advance(height + m.row_padding);
}

/// An image at full content width and fixed height.
pub fn image(w: &mut PageWriter, m: &Metrics, img: LoadedImage, height: f64) {
    w.ensure_space(height + m.row_padding);
    let (x, top, width) = (w.content_x(), w.y(), w.content_width());
    w.image(x, top, width, height, img);
    w.advance(height + m.row_padding);
}

/// A fully bordered table. The first row is the header and the first
/// column holds row labels; both are set in bold.
pub fn table(
    w: &mut PageWriter,
    m: &Metrics,
    rows: &[Vec<String>],
    first_col_width: f64,
    header_fill: Option<Color>,
) {
    let Some(columns) = rows.iter().map(Vec::len).max() else {
        return;
    };
    let row_height = m.line_height + 2.0 * m.cell_padding;
    let heights = vec![row_height; rows.len()];
    w.ensure_space(row_height * rows.len() as f64 + m.row_padding);

    let grid = TableGrid::with_label_column(
        w.content_x(),
        w.y(),
        w.content_width(),
        first_col_width,
        columns,
        &heights,
    );

    if let Some(fill) = header_fill {
        let r = grid.row_rect(0);
        w.set_fill(fill);
        w.rect(r.x, r.y, r.width, r.height, 0.0, Paint::Fill);
    }

    for (ri, row) in rows.iter().enumerate() {
        for (ci, value) in row.iter().enumerate() {
            let cell = grid.cell_rect(ri, ci);
            let (style, align) = if ri == 0 || ci == 0 {
                (m.label(), if ci == 0 { Align::Left } else { Align::Center })
            } else {
                (m.body(), Align::Center)
            };
            let inner = cell.width - 2.0 * m.cell_padding;
            let x = aligned_x(w, cell.x + m.cell_padding, inner, value, &style, align);
            w.text(x, cell.y + m.cell_padding, value, style, m.line_height);
        }
    }

    w.set_stroke(m.ink, 0.5);
    for s in grid.border_segments() {
        w.line(s.x1, s.y1, s.x2, s.y2);
    }
    w.advance(grid.height() + m.row_padding);
}

/// Cut `text` to fit `max_width`, marking the cut with an ellipsis.
fn truncate_to_width(w: &PageWriter, text: &str, max_width: f64, style: &TextStyle) -> BrokenLine {
    let width = w.measure(text, style);
    if width <= max_width {
        return BrokenLine {
            text: text.to_string(),
            width,
        };
    }
    let mut out = String::new();
    for ch in text.chars() {
        let candidate = format!("{}{}...", out, ch);
        if w.measure(&candidate, style) > max_width {
            break;
        }
        out.push(ch);
    }
    out.push_str("...");
    let width = w.measure(&out, style);
    BrokenLine { text: out, width }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BreakPolicy, DrawCommand, PageGeometry};

    fn writer() -> PageWriter {
        PageWriter::new(PageGeometry::a4(15.0), BreakPolicy::Strict)
    }

    #[test]
    fn two_column_advances_by_taller_side() {
        let mut w = writer();
        let m = Metrics::default();
        let before = w.y();
        two_column(
            &mut w,
            &m,
            Cell::new("Past History", "Asthma\nFracture\nAppendectomy"),
            Cell::new("Allergies", "None"),
        );
        let advanced = w.y() - before;
        assert!((advanced - (3.0 * m.line_height + m.row_padding)).abs() < 1e-9);

        let page = &w.finish()[0];
        let text = page.plain_text();
        assert!(text.contains("Past History: "));
        assert!(text.contains("Appendectomy"));
        assert!(text.contains("None"));
    }

    #[test]
    fn bands_start_at_the_same_y() {
        let mut w = writer();
        let m = Metrics::default();
        columns(
            &mut w,
            &m,
            &[Cell::new("ECG", "Normal"), Cell::new("X-Ray", "Clear"), Cell::new("PFT", "Normal")],
            3,
        );
        let page = &w.finish()[0];
        let tops: Vec<f64> = page.elements.iter().map(|e| e.y).collect();
        assert_eq!(tops.len(), 6);
        assert!(tops.iter().all(|&y| (y - tops[0]).abs() < 1e-9));
        let xs: Vec<f64> = page.elements.iter().step_by(2).map(|e| e.x).collect();
        assert!(xs[0] < xs[1] && xs[1] < xs[2]);
    }

    #[test]
    fn values_align_after_label_column() {
        let w = writer();
        let m = Metrics::default();
        let short = measure_key_value(&w, &m, "Age", "34", 250.0, true);
        let other = measure_key_value(&w, &m, "Gender", "Male", 250.0, true);
        assert_eq!(short.label_width, m.label_min_width);
        assert_eq!(short.label_width, other.label_width);
    }

    #[test]
    fn overlong_label_is_cut_to_its_column() {
        let w = writer();
        let m = Metrics::default();
        let label = "Occupational Exposure To Noise Above Permissible Limits";
        let block = measure_key_value(&w, &m, label, "No", 200.0, true);
        assert_eq!(block.label_width, 120.0);
        assert!(block.label.ends_with("...: "));
        assert!(w.measure(&block.label, &m.label()) <= block.label_width);

        let mut w = writer();
        key_value(&mut w, &m, label, "No", true);
        let page = &w.finish()[0];
        let (label_el, value_el) = (&page.elements[0], &page.elements[1]);
        assert!(label_el.x + label_el.width <= value_el.x);
    }

    #[test]
    fn label_under_the_cap_is_kept_whole() {
        let w = writer();
        let m = Metrics::default();
        let block = measure_key_value(&w, &m, "Expected Weight (kg)", "60", 250.0, true);
        assert_eq!(block.label, "Expected Weight (kg): ");
    }

    #[test]
    fn non_wrapping_value_is_truncated() {
        let w = writer();
        let m = Metrics::default();
        let block = measure_key_value(&w, &m, "Name", &"W".repeat(200), 200.0, false);
        assert_eq!(block.lines.len(), 1);
        assert!(block.lines[0].text.ends_with("..."));
        assert!(block.lines[0].width <= 200.0 - block.label_width);
    }

    #[test]
    fn empty_paragraph_still_takes_a_line() {
        let mut w = writer();
        let m = Metrics::default();
        let before = w.y();
        paragraph(&mut w, &m, None, "   ");
        assert!((w.y() - before - (m.line_height + m.row_padding)).abs() < 1e-9);
    }

    #[test]
    fn long_paragraph_continues_on_next_page() {
        let mut w = writer();
        let m = Metrics::default();
        let body = "Follow up in three months with repeat audiometry. ".repeat(200);
        paragraph(&mut w, &m, Some("Advice"), &body);
        let pages = w.finish();
        assert!(pages.len() >= 2);
        for page in &pages {
            for el in &page.elements {
                assert!(el.y + el.height <= page.height - PageGeometry::a4(15.0).margin_bottom + 1e-6);
            }
        }
    }

    #[test]
    fn section_header_is_never_orphaned() {
        let mut w = writer();
        let m = Metrics::default();
        let limit = w.bottom_limit();
        // Leave room for the header alone but not a row beneath it
        w.advance(limit - w.y() - m.section_height() - 1.0);
        section_header(&mut w, &m, "Vision Examination");
        assert_eq!(w.page_index(), 1);
        let pages = w.finish();
        assert_eq!(pages[1].plain_text(), "VISION EXAMINATION");
    }

    #[test]
    fn table_draws_every_border_segment() {
        let mut w = writer();
        let m = Metrics::default();
        let rows = vec![
            vec!["Frequency".into(), "500 Hz".into(), "1K Hz".into()],
            vec!["Right Ear".into(), "15".into(), "10".into()],
            vec!["Left Ear".into(), "20".into(), "25".into()],
        ];
        let before = w.y();
        table(&mut w, &m, &rows, 80.0, Some(Color::WHITE));
        let row_height = m.line_height + 2.0 * m.cell_padding;
        assert!((w.y() - before - (3.0 * row_height + m.row_padding)).abs() < 1e-9);

        let page = &w.finish()[0];
        let lines = page
            .elements
            .iter()
            .filter(|e| matches!(e.draw, DrawCommand::Line { .. }))
            .count();
        assert_eq!(lines, 4 + 4);
        assert!(page.plain_text().contains("Right Ear"));
    }

    #[test]
    fn badge_is_rounded_and_tinted() {
        let mut w = writer();
        let m = Metrics::default();
        badge(&mut w, &m, "Right Ear: Normal", "Left Ear: Abnormal", m.accent);
        let page = &w.finish()[0];
        match &page.elements[0].draw {
            DrawCommand::Rect { background, border, radius } => {
                assert!(*radius > 0.0);
                assert_eq!(*background, Some(m.accent.tint(0.88)));
                assert_eq!(border.map(|b| b.color), Some(m.accent));
            }
            other => panic!("expected the badge box first, got {:?}", other),
        }
        assert_eq!(page.plain_text(), "Right Ear: Normal\nLeft Ear: Abnormal");
    }
}
