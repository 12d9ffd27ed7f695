//! # Table Grid
//!
//! Geometry for fully bordered tables. Column and row offsets are computed
//! once; border segments and cell rectangles both read from the same
//! offsets, so text and rules can never drift apart.

/// A rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One straight border segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableGrid {
    x: f64,
    y: f64,
    /// `columns + 1` x offsets, left edge first.
    col_offsets: Vec<f64>,
    /// `rows + 1` y offsets, top edge first.
    row_offsets: Vec<f64>,
}

impl TableGrid {
    pub fn new(x: f64, y: f64, col_widths: &[f64], row_heights: &[f64]) -> Self {
        Self {
            x,
            y,
            col_offsets: offsets(x, col_widths),
            row_offsets: offsets(y, row_heights),
        }
    }

    /// Equal columns spanning `total_width`, with the first column set to
    /// `first_width`.
    pub fn with_label_column(
        x: f64,
        y: f64,
        total_width: f64,
        first_width: f64,
        columns: usize,
        row_heights: &[f64],
    ) -> Self {
        let rest = columns.saturating_sub(1).max(1) as f64;
        let other = (total_width - first_width).max(0.0) / rest;
        let mut widths = vec![first_width];
        widths.extend(std::iter::repeat(other).take(columns.saturating_sub(1)));
        Self::new(x, y, &widths, row_heights)
    }

    pub fn columns(&self) -> usize {
        self.col_offsets.len() - 1
    }

    pub fn rows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    pub fn width(&self) -> f64 {
        self.col_offsets[self.col_offsets.len() - 1] - self.x
    }

    pub fn height(&self) -> f64 {
        self.row_offsets[self.row_offsets.len() - 1] - self.y
    }

    pub fn col_offsets(&self) -> &[f64] {
        &self.col_offsets
    }

    pub fn row_offsets(&self) -> &[f64] {
        &self.row_offsets
    }

    /// The rectangle of one cell. Out-of-range indices clamp to the last cell.
    pub fn cell_rect(&self, row: usize, col: usize) -> CellRect {
        let row = row.min(self.rows().saturating_sub(1));
        let col = col.min(self.columns().saturating_sub(1));
        CellRect {
            x: self.col_offsets[col],
            y: self.row_offsets[row],
            width: self.col_offsets[col + 1] - self.col_offsets[col],
            height: self.row_offsets[row + 1] - self.row_offsets[row],
        }
    }

    /// The full-width rectangle of one row.
    pub fn row_rect(&self, row: usize) -> CellRect {
        let first = self.cell_rect(row, 0);
        CellRect {
            x: self.x,
            width: self.width(),
            ..first
        }
    }

    /// Every horizontal rule (one per row offset) followed by every vertical
    /// rule (one per column offset).
    pub fn border_segments(&self) -> Vec<Segment> {
        let left = self.x;
        let right = self.x + self.width();
        let top = self.y;
        let bottom = self.y + self.height();

        let horizontal = self.row_offsets.iter().map(|&y| Segment {
            x1: left,
            y1: y,
            x2: right,
            y2: y,
        });
        let vertical = self.col_offsets.iter().map(|&x| Segment {
            x1: x,
            y1: top,
            x2: x,
            y2: bottom,
        });
        horizontal.chain(vertical).collect()
    }
}

fn offsets(start: f64, sizes: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(sizes.len() + 1);
    let mut at = start;
    out.push(at);
    for size in sizes {
        at += size.max(0.0);
        out.push(at);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_accumulate() {
        let grid = TableGrid::new(10.0, 20.0, &[50.0, 30.0, 30.0], &[15.0, 12.0]);
        assert_eq!(grid.col_offsets(), &[10.0, 60.0, 90.0, 120.0]);
        assert_eq!(grid.row_offsets(), &[20.0, 35.0, 47.0]);
        assert_eq!(grid.width(), 110.0);
        assert_eq!(grid.height(), 27.0);
    }

    #[test]
    fn segment_count_covers_every_edge() {
        // 7 columns x 3 rows: 4 horizontal + 8 vertical rules
        let grid = TableGrid::with_label_column(0.0, 0.0, 500.0, 80.0, 7, &[16.0; 3]);
        let segments = grid.border_segments();
        assert_eq!(segments.len(), 12);
        assert!(segments[..4].iter().all(|s| s.y1 == s.y2 && s.x2 - s.x1 == 500.0));
        assert!(segments[4..].iter().all(|s| s.x1 == s.x2 && s.y2 - s.y1 == 48.0));
    }

    #[test]
    fn cells_share_border_offsets() {
        let grid = TableGrid::with_label_column(0.0, 100.0, 500.0, 80.0, 7, &[16.0, 14.0, 14.0]);
        let cell = grid.cell_rect(2, 3);
        assert_eq!(cell.x, grid.col_offsets()[3]);
        assert_eq!(cell.y, grid.row_offsets()[2]);
        assert_eq!(cell.height, 14.0);
        assert!((cell.width - 70.0).abs() < 1e-9);
        assert_eq!(grid.row_rect(0).width, 500.0);
    }

    #[test]
    fn out_of_range_cell_clamps() {
        let grid = TableGrid::new(0.0, 0.0, &[10.0, 10.0], &[5.0]);
        assert_eq!(grid.cell_rect(9, 9), grid.cell_rect(0, 1));
    }
}
