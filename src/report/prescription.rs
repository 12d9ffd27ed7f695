//! Blank prescription pad: a single-page letterhead with a ruled writing
//! area. Blank letterhead fields fall back to the configured settings.

use tracing::info_span;

use super::{format_date, ReportContext};
use crate::error::ReportError;
use crate::layout::primitives::{self, aligned_x, Align, Cell};
use crate::layout::{BreakPolicy, LayoutPage, Metrics, PageWriter};
use crate::model::PrescriptionPad;
use crate::style::TextStyle;

const RULE_SPACING: f64 = 24.0;
const SIGNATURE_AREA: f64 = 64.0;
const SIGNATURE_WIDTH: f64 = 170.0;

/// Fill blank letterhead fields from the hospital settings and the
/// prescription defaults.
pub fn with_defaults(pad: &PrescriptionPad, ctx: &ReportContext) -> PrescriptionPad {
    let mut pad = pad.clone();
    let fill = |field: &mut String, fallback: &str| {
        if field.trim().is_empty() {
            *field = fallback.trim().to_string();
        }
    };
    let address = [&ctx.settings.address_line1, &ctx.settings.address_line2]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    fill(&mut pad.hospital_name, &ctx.settings.hospital_name);
    fill(&mut pad.address, &address);
    fill(&mut pad.doctor_name, &ctx.prescription.doctor_name);
    fill(&mut pad.qualification, &ctx.prescription.qualification);
    fill(&mut pad.registration_number, &ctx.prescription.registration_number);
    fill(&mut pad.phone, &ctx.prescription.phone);
    fill(&mut pad.timings, &ctx.prescription.timings);
    pad
}

/// Lay out the pad on one page.
pub fn render_prescription(
    pad: &PrescriptionPad,
    ctx: &ReportContext,
) -> Result<Vec<LayoutPage>, ReportError> {
    let pad = with_defaults(pad, ctx);
    let missing = pad.missing_fields();
    if !missing.is_empty() {
        return Err(ReportError::Validation { missing });
    }
    let _span = info_span!("render_prescription", doctor = %pad.doctor_name).entered();

    let m = ctx.metrics();
    let mut w = PageWriter::new(ctx.geometry(), BreakPolicy::Strict);

    draw_heading(&mut w, &m, &pad);
    primitives::rule(&mut w, m.accent, 1.2, 8.0);

    let patient = Metrics {
        label_min_width: 0.0,
        ..m
    };
    primitives::columns(
        &mut w,
        &patient,
        &[
            Cell::new("Patient", pad.patient_name.as_str()),
            Cell::new("Age", pad.age.map(|a| a.to_string()).unwrap_or_default()),
            Cell::new("Sex", pad.gender.as_str()),
            Cell::new("Date", format_date(pad.date)),
        ],
        4,
    );
    w.advance(2.0);
    primitives::rule(&mut w, m.ink.tint(0.5), 0.5, 10.0);

    let rx = TextStyle::bold(28.0).with_color(m.accent);
    primitives::aligned_line(&mut w, "Rx", rx, 34.0, Align::Left);

    draw_writing_lines(&mut w, &m);
    draw_signature(&mut w, &m, &pad);
    Ok(w.finish())
}

/// Hospital block on the left, doctor block on the right, sharing a top.
fn draw_heading(w: &mut PageWriter, m: &Metrics, pad: &PrescriptionPad) {
    let top = w.y();
    let half = (w.content_width() - m.gutter) / 2.0;
    let left_x = w.content_x();
    let right_x = left_x + half + m.gutter;

    let contact = |label: &str, value: &str| {
        if value.is_empty() {
            String::new()
        } else {
            format!("{}: {}", label, value)
        }
    };

    let hospital = [
        (pad.hospital_name.clone(), TextStyle::bold(16.0).with_color(m.accent), 20.0),
        (pad.address.clone(), m.body(), m.line_height),
        (contact("Phone", &pad.phone), m.body(), m.line_height),
    ];
    let doctor = [
        (pad.doctor_name.clone(), TextStyle::bold(13.0).with_color(m.ink), 18.0),
        (pad.qualification.clone(), m.body(), m.line_height),
        (contact("Reg. No", &pad.registration_number), m.body(), m.line_height),
        (contact("Timings", &pad.timings), m.body(), m.line_height),
    ];

    let left = draw_block(w, left_x, top, half, &hospital, Align::Left);
    let right = draw_block(w, right_x, top, half, &doctor, Align::Right);
    w.advance(left.max(right) + 4.0);
}

/// Wrapped lines stacked from `top`. Returns the height used.
fn draw_block(
    w: &mut PageWriter,
    x: f64,
    top: f64,
    width: f64,
    entries: &[(String, TextStyle, f64)],
    align: Align,
) -> f64 {
    let mut y = top;
    for (text, style, line_height) in entries {
        if text.trim().is_empty() {
            continue;
        }
        for line in w.wrap(text, width, style) {
            let lx = aligned_x(w, x, width, &line.text, style, align);
            w.text(lx, y, &line.text, *style, *line_height);
            y += line_height;
        }
    }
    y - top
}

/// Light horizontal rules from the cursor down to the signature area.
fn draw_writing_lines(w: &mut PageWriter, m: &Metrics) {
    let bottom = w.geometry().height - w.geometry().margin_bottom - SIGNATURE_AREA;
    let x = w.content_x();
    let width = w.content_width();
    w.set_stroke(m.ink.tint(0.8), 0.4);
    let mut y = w.y() + RULE_SPACING;
    while y <= bottom {
        w.line(x, y, x + width, y);
        y += RULE_SPACING;
    }
    let remaining = bottom - w.y();
    w.advance(remaining);
}

/// Signature line and caption at the bottom right.
fn draw_signature(w: &mut PageWriter, m: &Metrics, pad: &PrescriptionPad) {
    let x2 = w.content_x() + w.content_width();
    let x1 = x2 - SIGNATURE_WIDTH;
    let y = w.y() + SIGNATURE_AREA - 2.0 * m.line_height - 6.0;
    w.set_stroke(m.ink, 0.6);
    w.line(x1, y, x2, y);

    let caption = m.label();
    let cx = aligned_x(w, x1, SIGNATURE_WIDTH, "Doctor's Signature", &caption, Align::Center);
    w.text(cx, y + 3.0, "Doctor's Signature", caption, m.line_height);
    let name = m.body();
    let nx = aligned_x(w, x1, SIGNATURE_WIDTH, &pad.doctor_name, &name, Align::Center);
    w.text(nx, y + 3.0 + m.line_height, &pad.doctor_name, name, m.line_height);
}
