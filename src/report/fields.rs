//! # Field Registry
//!
//! Template sections are declared as constant slices of [`FieldSpec`] and
//! drawn by one loop. Adjacent left/right fields share a row; full-width
//! fields get their own.

use crate::layout::primitives::{self, Cell};
use crate::layout::{Metrics, PageWriter};
use crate::model::PatientRecord;

/// Which band of a two-column row a field occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Left,
    Right,
    Full,
}

/// A labelled value read from a record.
#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub value: fn(&PatientRecord) -> String,
    pub column: Column,
    /// Wrap long values onto further lines instead of truncating.
    pub wrap: bool,
}

impl FieldSpec {
    pub const fn left(label: &'static str, value: fn(&PatientRecord) -> String) -> Self {
        Self {
            label,
            value,
            column: Column::Left,
            wrap: true,
        }
    }

    pub const fn right(label: &'static str, value: fn(&PatientRecord) -> String) -> Self {
        Self {
            label,
            value,
            column: Column::Right,
            wrap: true,
        }
    }

    pub const fn full(label: &'static str, value: fn(&PatientRecord) -> String) -> Self {
        Self {
            label,
            value,
            column: Column::Full,
            wrap: true,
        }
    }

    pub const fn no_wrap(mut self) -> Self {
        self.wrap = false;
        self
    }

    pub fn cell(&self, record: &PatientRecord) -> Cell {
        Cell {
            label: self.label.to_string(),
            value: (self.value)(record),
            wrap: self.wrap,
        }
    }
}

/// Rows as they will be drawn: one or two cells each.
pub fn rows(fields: &[FieldSpec]) -> Vec<Vec<&FieldSpec>> {
    let mut rows = Vec::new();
    let mut i = 0;
    while i < fields.len() {
        let field = &fields[i];
        let pairs_with_next = field.column == Column::Left
            && fields.get(i + 1).is_some_and(|next| next.column == Column::Right);
        if pairs_with_next {
            rows.push(vec![field, &fields[i + 1]]);
            i += 2;
        } else {
            rows.push(vec![field]);
            i += 1;
        }
    }
    rows
}

/// Draw every field of a section.
pub fn draw_fields(w: &mut PageWriter, m: &Metrics, fields: &[FieldSpec], record: &PatientRecord) {
    for row in rows(fields) {
        let cells: Vec<Cell> = row.iter().map(|f| f.cell(record)).collect();
        match row[0].column {
            Column::Full => {
                let cell = &cells[0];
                primitives::key_value(w, m, &cell.label, &cell.value, cell.wrap);
            }
            Column::Left => primitives::columns(w, m, &cells, 2),
            // Unpaired right field keeps its band.
            Column::Right => primitives::columns_from(w, m, &cells, 1, 2),
        }
    }
}

/// `"170 cm"` style formatting for optional measurements.
pub fn with_unit(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", trim_number(v), unit),
        None => String::new(),
    }
}

/// Up to one decimal place, without a trailing `.0`.
pub fn trim_number(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}

pub fn opt_u32(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BreakPolicy, DrawCommand, PageGeometry};

    const SECTION: &[FieldSpec] = &[
        FieldSpec::left("Name", |r| r.name.clone()),
        FieldSpec::right("Age", |r| opt_u32(r.age)),
        FieldSpec::full("Allergies", |r| r.allergies.clone()),
        FieldSpec::left("Gender", |r| r.gender.clone()),
        FieldSpec::left("Department", |r| r.department.clone()),
        FieldSpec::right("Contractor", |r| r.contractor.clone()),
    ];

    #[test]
    fn left_right_pairs_share_a_row() {
        let labels: Vec<Vec<&str>> = rows(SECTION)
            .iter()
            .map(|row| row.iter().map(|f| f.label).collect())
            .collect();
        assert_eq!(
            labels,
            vec![
                vec!["Name", "Age"],
                vec!["Allergies"],
                vec!["Gender"],
                vec!["Department", "Contractor"],
            ]
        );
    }

    #[test]
    fn draws_each_row_once() {
        let mut w = PageWriter::new(PageGeometry::a4(15.0), BreakPolicy::Strict);
        let m = Metrics::default();
        let record = PatientRecord {
            name: "Asha".to_string(),
            age: Some(29),
            ..Default::default()
        };
        let before = w.y();
        draw_fields(&mut w, &m, SECTION, &record);
        assert!((w.y() - before - 4.0 * m.row_height()).abs() < 1e-9);
        let text = w.finish()[0].plain_text();
        assert!(text.contains("Name: \nAsha\nAge: \n29"));
    }

    #[test]
    fn lone_right_field_stays_in_the_right_band() {
        const LONE: &[FieldSpec] = &[FieldSpec::right("Contractor", |r| r.contractor.clone())];
        let mut w = PageWriter::new(PageGeometry::a4(15.0), BreakPolicy::Strict);
        let m = Metrics::default();
        let record = PatientRecord {
            contractor: "Acme".to_string(),
            ..Default::default()
        };
        let right_band = w.content_x() + primitives::band_width(&w, &m, 2) + m.gutter;
        draw_fields(&mut w, &m, LONE, &record);
        let page = &w.finish()[0];
        let label = page
            .elements
            .iter()
            .find(|e| matches!(&e.draw, DrawCommand::Text { lines, .. } if lines[0].text == "Contractor: "))
            .unwrap();
        assert!((label.x - right_band).abs() < 1e-9);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(trim_number(170.0), "170");
        assert_eq!(trim_number(72.46), "72.5");
        assert_eq!(with_unit(Some(65.0), "kg"), "65 kg");
        assert_eq!(with_unit(None, "kg"), "");
    }
}
