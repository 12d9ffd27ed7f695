//! Audiometry report: patient grid, threshold table, one audiogram per ear
//! and a status badge.

use super::fields::opt_u32;
use super::{draw_letterhead, format_date, Composer, ReportContext, ReportKind};
use crate::chart::{render_audiogram, Audiogram, ChartSpec};
use crate::error::ReportError;
use crate::image_loader::{decode_image_bytes, LoadedImage};
use crate::layout::primitives::{self, Align, Cell};
use crate::layout::{mm, BreakPolicy, Metrics, PageWriter};
use crate::model::audiometry::frequency_label;
use crate::model::{EarReadings, EarStatus, PatientRecord, STANDARD_FREQUENCIES};
use crate::style::{Color, TextStyle};

pub const RIGHT_EAR_COLOR: [u8; 3] = [200, 30, 30];
pub const LEFT_EAR_COLOR: [u8; 3] = [30, 60, 200];
const ABNORMAL_COLOR: [u8; 3] = [192, 57, 43];

/// Audiogram rasters are drawn at twice the point size.
const CHART_OVERSAMPLE: f64 = 2.0;
const FREQUENCY_COLUMN_WIDTH: f64 = 80.0;

/// Tick labels on the chart, in points.
const CHART_LABEL_SIZE: f64 = 7.0;

pub struct AudiometryReport;

/// A rasterized audiogram ready to place.
#[derive(Debug)]
struct ChartImage {
    image: LoadedImage,
    chart: Audiogram,
}

impl AudiometryReport {
    /// Rasterize both ears. Empty hearing data yields no charts.
    fn charts(
        &self,
        record: &PatientRecord,
        width_pt: f64,
        height_pt: f64,
    ) -> Result<Vec<ChartImage>, ReportError> {
        if record.hearing.is_empty() {
            return Ok(Vec::new());
        }
        let width = (width_pt * CHART_OVERSAMPLE).round() as u32;
        let height = (height_pt * CHART_OVERSAMPLE).round() as u32;
        [
            (&record.hearing.right, "Right Ear", RIGHT_EAR_COLOR),
            (&record.hearing.left, "Left Ear", LEFT_EAR_COLOR),
        ]
        .into_iter()
        .map(|(readings, title, color)| {
            let chart = render_audiogram(readings, title, ChartSpec::new(width, height, color))?;
            let image = decode_image_bytes(&chart.png)?;
            Ok(ChartImage { image, chart })
        })
        .collect()
    }
}

/// Place one chart at full width and set its title and tick labels over
/// the raster's blank margins.
fn draw_chart(w: &mut PageWriter, m: &Metrics, rendered: ChartImage, height: f64) {
    w.ensure_space(height + m.row_padding);
    let (x, top, width) = (w.content_x(), w.y(), w.content_width());
    let ChartImage { image, chart } = rendered;
    let sx = width / chart.width as f64;
    let sy = height / chart.height as f64;
    primitives::image(w, m, image, height);

    let label = TextStyle::regular(CHART_LABEL_SIZE).with_color(m.ink);
    let line = CHART_LABEL_SIZE + 1.0;
    let frame_left = x + chart.frame.left as f64 * sx;
    let frame_bottom = top + chart.frame.bottom as f64 * sy;

    let title = TextStyle::bold(CHART_LABEL_SIZE + 1.0).with_color(m.ink);
    let title_top = top + (chart.frame.top as f64 * sy - line) / 2.0 - 2.0;
    w.text(frame_left, title_top.max(top), &chart.title, title, line);

    for tick in &chart.db_ticks {
        let right_edge = frame_left - 3.0;
        let tx = primitives::aligned_x(w, x, right_edge - x, &tick.label, &label, Align::Right);
        w.text(tx, top + tick.px as f64 * sy - line / 2.0, &tick.label, label, line);
    }
    for tick in &chart.frequency_ticks {
        let center = x + tick.px as f64 * sx;
        let half = w.measure(&tick.label, &label) / 2.0;
        w.text(center - half, frame_bottom + 2.0, &tick.label, label, line);
    }
}

fn patient_cells(r: &PatientRecord) -> Vec<Cell> {
    vec![
        Cell::new("Name", r.name.as_str()),
        Cell::new("Age", opt_u32(r.age)),
        Cell::new("Sex", r.gender.as_str()),
        Cell::new("Employee Code", r.employee_code.as_str()),
        Cell::new("Certificate No", r.certificate_number.as_str()),
        Cell::new("Department", r.department.as_str()),
        Cell::new("Contractor", r.contractor.as_str()),
        Cell::new("Test Date", format_date(r.test_date)),
        Cell::new("Contact", r.contact_number.as_str()),
    ]
}

/// Header row plus one row per ear. Unrecorded frequencies print as "-".
fn threshold_rows(r: &PatientRecord) -> Vec<Vec<String>> {
    let ear_row = |label: &str, ear: &EarReadings| -> Vec<String> {
        std::iter::once(label.to_string())
            .chain(STANDARD_FREQUENCIES.iter().map(|&f| {
                ear.get(f)
                    .map(|db| db.to_string())
                    .unwrap_or_else(|| "-".to_string())
            }))
            .collect()
    };
    vec![
        std::iter::once("Frequency".to_string())
            .chain(STANDARD_FREQUENCIES.iter().map(|&f| frequency_label(f)))
            .collect(),
        ear_row("Right Ear", &r.hearing.right),
        ear_row("Left Ear", &r.hearing.left),
    ]
}

fn badge_color(m: &Metrics, right: EarStatus, left: EarStatus) -> Color {
    if right == EarStatus::Normal && left == EarStatus::Normal {
        m.accent
    } else {
        Color::rgb8(ABNORMAL_COLOR)
    }
}

impl Composer for AudiometryReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Audiometry
    }

    fn policy(&self, ctx: &ReportContext) -> BreakPolicy {
        BreakPolicy::Lenient {
            slack: mm(ctx.page.lenient_slack_mm),
        }
    }

    fn compose(
        &self,
        record: &PatientRecord,
        w: &mut PageWriter,
        ctx: &ReportContext,
    ) -> Result<(), ReportError> {
        let m = ctx.metrics();
        w.set_policy(self.policy(ctx));
        let charts = self.charts(record, w.content_width(), ctx.chart_height())?;

        draw_letterhead(w, &m, ctx);
        let title = TextStyle::bold(13.0).with_color(m.ink);
        primitives::aligned_line(w, &self.kind().title().to_uppercase(), title, 18.0, Align::Center);

        primitives::section_header(w, &m, "Patient Information");
        for row in patient_cells(record).chunks(3) {
            primitives::columns(w, &m, row, 3);
        }

        primitives::section_header(w, &m, "Hearing Thresholds (dB HL)");
        primitives::table(
            w,
            &m,
            &threshold_rows(record),
            FREQUENCY_COLUMN_WIDTH,
            Some(m.accent.tint(0.85)),
        );

        if !charts.is_empty() {
            primitives::section_header(w, &m, "Audiogram");
            for chart in charts {
                draw_chart(w, &m, chart, ctx.chart_height());
            }
        }

        let (right, left) = (record.right_ear_status(), record.left_ear_status());
        primitives::badge(
            w,
            &m,
            &format!("Right Ear: {}", right),
            &format!("Left Ear: {}", left),
            badge_color(&m, right, left),
        );

        let remark = if record.audiometry.trim().is_empty() {
            &record.remarks
        } else {
            &record.audiometry
        };
        primitives::paragraph(w, &m, Some("Remarks"), remark);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DrawCommand, LayoutPage};
    use crate::model::Hearing;
    use crate::report::tests::complete_record;
    use crate::report::render_records;

    fn with_hearing(right: [i32; 6], left: [i32; 6]) -> PatientRecord {
        let mut r = complete_record("Asha");
        r.hearing = Hearing {
            right: EarReadings::from_levels(right),
            left: EarReadings::from_levels(left),
        };
        r
    }

    fn badge_border(page: &LayoutPage) -> Option<Color> {
        page.elements.iter().find_map(|el| match &el.draw {
            DrawCommand::Rect {
                border: Some(stroke),
                radius,
                ..
            } if *radius > 0.0 => Some(stroke.color),
            _ => None,
        })
    }

    #[test]
    fn threshold_table_marks_missing_readings() {
        let mut r = complete_record("Asha");
        r.hearing.right.set(500, 15);
        r.hearing.right.set(4000, 55);
        let rows = threshold_rows(&r);
        assert_eq!(rows[0][0], "Frequency");
        assert_eq!(rows[0][1], "500 Hz");
        assert_eq!(rows[0][6], "8K Hz");
        assert_eq!(rows[1], vec!["Right Ear", "15", "-", "-", "55", "-", "-"]);
        assert_eq!(rows[2], vec!["Left Ear", "-", "-", "-", "-", "-", "-"]);
    }

    #[test]
    fn full_report_fits_one_page_with_two_charts() {
        let r = with_hearing([15, 10, 15, 20, 15, 20], [15, 10, 15, 20, 15, 20]);
        let pages = render_records(ReportKind::Audiometry, &[r], &ReportContext::default()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].image_count(), 2);
        let text = pages[0].plain_text();
        assert!(text.contains("Right Ear: Normal"));
        assert!(text.contains("Left Ear: Normal"));
        assert!(text.contains("AUDIOMETRY REPORT"));
    }

    #[test]
    fn chart_labels_are_set_as_text() {
        let r = with_hearing([15; 6], [20; 6]);
        let pages = render_records(ReportKind::Audiometry, &[r], &ReportContext::default()).unwrap();
        let lines: Vec<&str> = pages[0].text_lines().collect();
        assert!(lines.contains(&"Right Ear (dB HL)"));
        assert!(lines.contains(&"Left Ear (dB HL)"));
        for label in ["-10", "0", "60", "120", "500", "1K", "8K"] {
            assert_eq!(lines.iter().filter(|l| **l == label).count(), 2, "label {}", label);
        }
    }

    #[test]
    fn chart_labels_stay_inside_the_image() {
        let r = with_hearing([15; 6], [20; 6]);
        let pages = render_records(ReportKind::Audiometry, &[r], &ReportContext::default()).unwrap();
        let images: Vec<_> = pages[0]
            .elements
            .iter()
            .filter(|el| matches!(el.draw, DrawCommand::Image { .. }))
            .collect();
        let first = images[0];
        let inside = pages[0].elements.iter().filter(|el| match &el.draw {
            DrawCommand::Text { lines, .. } => lines.iter().any(|l| l.text == "-10"),
            _ => false,
        });
        for el in inside.take(1) {
            assert!(el.x >= first.x && el.x + el.width <= first.x + first.width);
            assert!(el.y >= first.y && el.y + el.height <= first.y + first.height);
        }
    }

    #[test]
    fn charts_are_skipped_without_hearing_data() {
        let pages = render_records(
            ReportKind::Audiometry,
            &[complete_record("Asha")],
            &ReportContext::default(),
        )
        .unwrap();
        assert_eq!(pages[0].image_count(), 0);
        assert!(!pages[0].plain_text().contains("AUDIOGRAM"));
    }

    #[test]
    fn abnormal_ear_turns_the_badge_red() {
        let ctx = ReportContext::default();
        let normal = with_hearing([15; 6], [15; 6]);
        let pages = render_records(ReportKind::Audiometry, &[normal], &ctx).unwrap();
        assert_eq!(badge_border(&pages[0]), Some(ctx.metrics().accent));

        let abnormal = with_hearing([15, 10, 15, 55, 15, 20], [15; 6]);
        let pages = render_records(ReportKind::Audiometry, &[abnormal], &ctx).unwrap();
        assert_eq!(badge_border(&pages[0]), Some(Color::rgb8(ABNORMAL_COLOR)));
        assert!(pages[0].plain_text().contains("Right Ear: Abnormal"));
    }

    #[test]
    fn chart_rasters_are_oversampled() {
        let r = with_hearing([15; 6], [15; 6]);
        let charts = AudiometryReport.charts(&r, 500.0, 150.0).unwrap();
        assert_eq!(charts.len(), 2);
        assert_eq!((charts[0].image.width_px, charts[0].image.height_px), (1000, 300));
        assert_eq!(charts[1].chart.title, "Left Ear (dB HL)");
    }

    #[test]
    fn undersized_charts_fail_the_render() {
        let r = with_hearing([15; 6], [15; 6]);
        let err = AudiometryReport.charts(&r, 50.0, 20.0).unwrap_err();
        assert!(matches!(err, ReportError::Chart(_)));
    }

    #[test]
    fn lenient_policy_uses_configured_slack() {
        let ctx = ReportContext::default();
        assert_eq!(
            AudiometryReport.policy(&ctx),
            BreakPolicy::Lenient { slack: mm(3.0) }
        );
    }
}
