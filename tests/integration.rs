//! Integration tests for the medreport pipeline.
//!
//! These tests drive the public API end to end:
//! - records → pages → PDF bytes for both record templates
//! - batch pagination and per-record page runs
//! - validation gating (nothing is rendered on failure)
//! - strict vs lenient page-break policies
//! - CSV export / import round trip
//! - session gating and generated file names

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use medreport::config::Credential;
use medreport::layout::primitives::{self, Cell};
use medreport::layout::{mm, BreakPolicy, Metrics, PageGeometry, PageWriter};
use medreport::model::{EarReadings, Hearing};
use medreport::tabular::{export_csv, import_file};
use medreport::*;

// ─── Helpers ────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 14, 2, 9).unwrap()
}

fn record(name: &str, code: &str) -> PatientRecord {
    let mut r = PatientRecord {
        name: name.to_string(),
        age: Some(38),
        gender: "Male".to_string(),
        employee_code: code.to_string(),
        certificate_number: format!("OHC/{}", code),
        department: "Forging".to_string(),
        test_date: NaiveDate::from_ymd_opt(2026, 10, 17),
        height_cm: Some(172.0),
        weight_kg: Some(70.5),
        bp_systolic: Some(124),
        bp_diastolic: Some(82),
        hearing: Hearing {
            right: EarReadings::from_levels([15, 10, 15, 20, 15, 20]),
            left: EarReadings::from_levels([10, 15, 15, 25, 20, 20]),
        },
        remarks: "Fit for duty.".to_string(),
        ..Default::default()
    };
    r.refresh_derived();
    r
}

fn logged_in() -> AppContext {
    let mut config = AppConfig::default();
    config.settings.hospital_name = "Sunrise Occupational Health".to_string();
    config.credentials.push(Credential {
        username: "clinic".to_string(),
        password: "secret".to_string(),
    });
    let mut ctx = AppContext::new(config);
    ctx.login("clinic", "secret").unwrap();
    ctx
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

// ─── Full Pipeline ──────────────────────────────────────────────

#[test]
fn general_report_produces_valid_pdf() {
    let bytes = render_pdf(
        ReportKind::General,
        &[record("Asha", "E1")],
        &ReportContext::default(),
    )
    .unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(count(&bytes, b"/Type /Page "), 1);
}

#[test]
fn audiometry_report_embeds_two_charts() {
    let bytes = render_pdf(
        ReportKind::Audiometry,
        &[record("Asha", "E1")],
        &ReportContext::default(),
    )
    .unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(count(&bytes, b"/Subtype /Image"), 2);
}

// ─── Batches ────────────────────────────────────────────────────

#[test]
fn batch_gives_each_record_its_own_page() {
    let records = vec![record("Asha", "E1"), record("Ravi", "E2"), record("Meera", "E3")];
    let ctx = ReportContext::default();
    for kind in [ReportKind::General, ReportKind::Audiometry] {
        let pages = render_records(kind, &records, &ctx).unwrap();
        assert_eq!(pages.len(), 3, "{}", kind);
        for (page, r) in pages.iter().zip(&records) {
            let text = page.plain_text();
            assert!(text.starts_with(&ctx.settings.hospital_name), "letterhead first");
            assert!(text.contains(&r.name));
            for other in records.iter().filter(|o| o.name != r.name) {
                assert!(!text.contains(&other.name));
            }
        }
    }
}

#[test]
fn one_invalid_record_blocks_the_whole_batch() {
    let mut bad = record("Ravi", "E2");
    bad.test_date = None;
    let result = render_records(
        ReportKind::Audiometry,
        &[record("Asha", "E1"), bad],
        &ReportContext::default(),
    );
    match result {
        Err(ReportError::Validation { missing }) => {
            assert_eq!(missing, vec!["Test Date (record 2)"]);
        }
        other => panic!("expected validation error, got {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn missing_certificate_number_renders_nothing() {
    let mut bad = record("Asha", "E1");
    bad.certificate_number.clear();
    let ctx = logged_in();
    let err = export_pdf(&ctx, ReportKind::General, &[bad], now()).unwrap_err();
    assert!(matches!(err, ReportError::Validation { .. }));
    assert_eq!(
        Notice::from_error(&err).message,
        "Please fill in the required fields: Certificate Number"
    );
}

// ─── Page Breaks ────────────────────────────────────────────────

/// Rows of `height` until `n` rows have been drawn; returns rows per page.
fn rows_per_page(policy: BreakPolicy, height: f64, n: usize) -> Vec<usize> {
    let mut w = PageWriter::new(PageGeometry::a4(15.0), policy);
    let mut per_page = vec![0usize];
    for i in 0..n {
        if w.ensure_space(height) {
            per_page.push(0);
        }
        let (x, y) = (w.content_x(), w.y());
        w.text(x, y, &format!("Row {}", i), Metrics::default().body(), height);
        w.advance(height);
        if let Some(last) = per_page.last_mut() {
            *last += 1;
        }
    }
    assert_eq!(w.finish().len(), per_page.len());
    per_page
}

#[test]
fn strict_breaks_at_the_margin() {
    // 756.85pt of content height holds 37 rows of 20pt.
    assert_eq!(rows_per_page(BreakPolicy::Strict, 20.0, 40), vec![37, 3]);
}

#[test]
fn lenient_slack_keeps_one_more_row() {
    let lenient = BreakPolicy::Lenient { slack: mm(3.0) };
    assert_eq!(rows_per_page(lenient, 20.0, 40), vec![38, 2]);
}

#[test]
fn two_column_row_advances_by_the_taller_cell() {
    let m = Metrics::default();
    let mut w = PageWriter::new(PageGeometry::a4(15.0), BreakPolicy::Strict);
    let long = "Appendectomy in 2009 followed by an uneventful recovery and no further surgical history of note";
    let before = w.y();
    primitives::two_column(&mut w, &m, Cell::new("Past History", long), Cell::new("Age", "38"));
    let lines = ((w.y() - before - m.row_padding) / m.line_height).round();
    assert!(lines >= 2.0, "long value wraps");
    assert!((w.y() - before - (lines * m.line_height + m.row_padding)).abs() < 1e-9);
}

// ─── Tabular Round Trip ─────────────────────────────────────────

#[test]
fn csv_export_then_import_reproduces_records() {
    let mut second = record("Meera, Joshi", "E7");
    second.gender = "Female".to_string();
    second.past_history = vec!["Asthma".to_string(), "Fracture (2019)".to_string()];
    second.past_conditions.asthma = true;
    second.family_history.mother.present = true;
    second.family_history.mother.detail = "Diabetes".to_string();
    second.vision.glasses = true;
    second.vision.right_distance = "6/9".to_string();
    second.addictions.smoking = true;
    second.hearing.right = EarReadings::new();
    second.hearing.right.set(4000, 55);
    second.refresh_derived();

    let book = RecordBook::from_records(vec![record("Asha", "E1"), second], now());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.csv");
    let file = std::fs::File::create(&path).unwrap();
    export_csv(book.list(), file).unwrap();

    let imported = import_file(&path).unwrap();
    assert_eq!(imported.as_slice(), book.list());
}

// ─── Export Boundary ────────────────────────────────────────────

#[test]
fn export_is_refused_without_login() {
    let mut ctx = logged_in();
    ctx.session.logout();
    let err = export_pdf(&ctx, ReportKind::General, &[record("Asha", "E1")], now()).unwrap_err();
    assert!(matches!(err, ReportError::Unauthenticated { ref redirect } if redirect == "/login"));
}

#[test]
fn file_names_follow_the_record() {
    let ctx = logged_in();
    let single = export_pdf(&ctx, ReportKind::Audiometry, &[record("Asha Rao", "E-1")], now()).unwrap();
    assert_eq!(single.filename, "Audiometry_Report_Asha_Rao_E-1_20261017_140209.pdf");
    assert_valid_pdf(&single.bytes);

    let batch = export_pdf(
        &ctx,
        ReportKind::General,
        &[record("Asha", "E1"), record("Ravi", "E2")],
        now(),
    )
    .unwrap();
    assert_eq!(batch.filename, "Medical_Report_Batch_2026-10-17.pdf");
    assert_eq!(batch.pages, 2);

    let dir = tempfile::tempdir().unwrap();
    let written = batch.write_to(dir.path()).unwrap();
    assert_eq!(std::fs::read(written).unwrap(), batch.bytes);
}

#[test]
fn prescription_pad_uses_configured_doctor() {
    let mut ctx = logged_in();
    ctx.config.settings.address_line1 = "12 Station Road, Pune".to_string();
    ctx.config.prescription.doctor_name = "Dr. S. Mehta".to_string();
    let artifact = export_prescription(&ctx, &PrescriptionPad::default(), now()).unwrap();
    assert_eq!(artifact.pages, 1);
    assert_eq!(artifact.filename, "Prescription_20261017_140209.pdf");
    assert_valid_pdf(&artifact.bytes);
}
