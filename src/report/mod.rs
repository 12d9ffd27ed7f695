//! # Report Composers
//!
//! One composer per template. A composer knows its required fields, its
//! page-break policy and how to draw one record with the layout primitives.
//! [`render_records`] drives a composer over a batch: every record is
//! validated before anything is drawn, then each record starts on a new
//! page of one shared writer.

pub mod audiometry;
pub mod fields;
pub mod general;
pub mod prescription;

use std::fmt;

use tracing::{debug, info_span};

use crate::config::{AppConfig, HospitalSettings, PageSettings, PrescriptionDefaults};
use crate::error::ReportError;
use crate::image_loader::{load_image_file, LoadedImage};
use crate::layout::primitives::{self, Align};
use crate::layout::{mm, BreakPolicy, LayoutPage, Metrics, PageGeometry, PageWriter};
use crate::model::PatientRecord;
use crate::style::{Palette, TextStyle};

pub use audiometry::AudiometryReport;
pub use general::GeneralReport;
pub use prescription::render_prescription;

/// The record-based report templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    General,
    Audiometry,
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::General => "Medical Examination Report",
            ReportKind::Audiometry => "Audiometry Report",
        }
    }

    /// Leading part of exported file names.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            ReportKind::General => "Medical_Report",
            ReportKind::Audiometry => "Audiometry_Report",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Everything a composer reads besides the record itself.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub settings: HospitalSettings,
    pub palette: Palette,
    pub page: PageSettings,
    pub prescription: PrescriptionDefaults,
    pub logo: Option<LoadedImage>,
}

impl ReportContext {
    /// Resolve the configuration once per export, loading the logo if set.
    pub fn from_config(config: &AppConfig) -> Result<Self, ReportError> {
        let logo = match &config.settings.logo_path {
            Some(path) => Some(load_image_file(path)?),
            None => None,
        };
        Ok(Self {
            settings: config.settings.clone(),
            palette: config.palette,
            page: config.page,
            prescription: config.prescription.clone(),
            logo,
        })
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::a4(self.page.margin_mm)
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::with_palette(&self.palette)
    }

    pub fn chart_height(&self) -> f64 {
        mm(self.page.chart_height_mm)
    }
}

/// A field that must be filled in before a report is drawn.
pub struct RequiredField {
    pub label: &'static str,
    pub present: fn(&PatientRecord) -> bool,
}

/// Identity fields every record-based report needs.
pub const IDENTITY_FIELDS: &[RequiredField] = &[
    RequiredField {
        label: "Name",
        present: |r| !r.name.trim().is_empty(),
    },
    RequiredField {
        label: "Test Date",
        present: |r| r.test_date.is_some(),
    },
    RequiredField {
        label: "Age",
        present: |r| r.age.is_some(),
    },
    RequiredField {
        label: "Sex",
        present: |r| !r.gender.trim().is_empty(),
    },
    RequiredField {
        label: "Certificate Number",
        present: |r| !r.certificate_number.trim().is_empty(),
    },
];

pub trait Composer {
    fn kind(&self) -> ReportKind;

    fn policy(&self, ctx: &ReportContext) -> BreakPolicy;

    fn required_fields(&self) -> &'static [RequiredField] {
        IDENTITY_FIELDS
    }

    /// Labels of the required fields `record` leaves blank.
    fn missing_fields(&self, record: &PatientRecord) -> Vec<String> {
        self.required_fields()
            .iter()
            .filter(|f| !(f.present)(record))
            .map(|f| f.label.to_string())
            .collect()
    }

    /// Draw one record starting at the writer's cursor.
    fn compose(
        &self,
        record: &PatientRecord,
        w: &mut PageWriter,
        ctx: &ReportContext,
    ) -> Result<(), ReportError>;
}

pub fn composer_for(kind: ReportKind) -> Box<dyn Composer> {
    match kind {
        ReportKind::General => Box::new(GeneralReport),
        ReportKind::Audiometry => Box::new(AudiometryReport),
    }
}

/// Check every record. Batch errors name the record each field belongs to.
pub fn validate_records(composer: &dyn Composer, records: &[PatientRecord]) -> Result<(), ReportError> {
    if records.is_empty() {
        return Err(ReportError::Render("no records to render".to_string()));
    }
    let single = records.len() == 1;
    let missing: Vec<String> = records
        .iter()
        .enumerate()
        .flat_map(|(i, record)| {
            composer
                .missing_fields(record)
                .into_iter()
                .map(move |label| {
                    if single {
                        label
                    } else {
                        format!("{} (record {})", label, i + 1)
                    }
                })
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::Validation { missing })
    }
}

/// Lay out `records` in input order, one record per page run.
///
/// Nothing is drawn if any record fails validation.
pub fn render_records(
    kind: ReportKind,
    records: &[PatientRecord],
    ctx: &ReportContext,
) -> Result<Vec<LayoutPage>, ReportError> {
    let composer = composer_for(kind);
    validate_records(composer.as_ref(), records)?;

    let mut w = PageWriter::new(ctx.geometry(), composer.policy(ctx));
    for (index, record) in records.iter().enumerate() {
        let _span = info_span!("render_record", kind = ?composer.kind(), index, name = %record.name).entered();
        if index > 0 {
            w.new_page();
        }
        composer.compose(record, &mut w, ctx)?;
        debug!(pages = w.page_index() + 1, "record composed");
    }
    Ok(w.finish())
}

/// Letterhead shared by the record-based templates: logo, centered hospital
/// name and address, then the company name and a rule.
pub(crate) fn draw_letterhead(w: &mut PageWriter, m: &Metrics, ctx: &ReportContext) {
    let top = w.y();
    if let Some(logo) = &ctx.logo {
        let (width, height) = logo.fit_within(80.0, 40.0);
        let x = w.content_x();
        w.image(x, top, width, height, logo.clone());
    }

    let name_style = TextStyle::bold(18.0).with_color(m.accent);
    primitives::aligned_line(w, &ctx.settings.hospital_name, name_style, 24.0, Align::Center);
    for line in [&ctx.settings.address_line1, &ctx.settings.address_line2] {
        if !line.trim().is_empty() {
            primitives::aligned_line(w, line, m.body(), m.line_height, Align::Center);
        }
    }
    if ctx.logo.is_some() && w.y() < top + 42.0 {
        let gap = top + 42.0 - w.y();
        w.advance(gap);
    }
    if !ctx.settings.company_name.trim().is_empty() {
        let style = TextStyle::bold(10.0).with_color(m.ink);
        primitives::aligned_line(w, &ctx.settings.company_name, style, 14.0, Align::Left);
    }
    w.advance(2.0);
    primitives::rule(w, m.accent, 1.0, 6.0);
}

/// `dd/mm/yyyy`, or empty.
pub(crate) fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn complete_record(name: &str) -> PatientRecord {
        PatientRecord {
            name: name.to_string(),
            age: Some(34),
            gender: "Male".to_string(),
            certificate_number: format!("CERT-{}", name.len()),
            test_date: NaiveDate::from_ymd_opt(2026, 10, 17),
            ..Default::default()
        }
    }

    #[test]
    fn missing_fields_are_listed_in_order() {
        let record = PatientRecord {
            name: "Asha".to_string(),
            ..Default::default()
        };
        let missing = GeneralReport.missing_fields(&record);
        assert_eq!(missing, vec!["Test Date", "Age", "Sex", "Certificate Number"]);
    }

    #[test]
    fn batch_errors_name_the_record() {
        let mut second = complete_record("Ravi");
        second.certificate_number.clear();
        let records = vec![complete_record("Asha"), second];
        let err = validate_records(&GeneralReport, &records).unwrap_err();
        match err {
            ReportError::Validation { missing } => {
                assert_eq!(missing, vec!["Certificate Number (record 2)"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_batch_renders_nothing() {
        let mut bad = complete_record("Ravi");
        bad.certificate_number = "  ".to_string();
        let result = render_records(
            ReportKind::General,
            &[complete_record("Asha"), bad],
            &ReportContext::default(),
        );
        assert!(matches!(result, Err(ReportError::Validation { .. })));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let result = render_records(ReportKind::Audiometry, &[], &ReportContext::default());
        assert!(matches!(result, Err(ReportError::Render(_))));
    }

    #[test]
    fn each_record_starts_a_new_page() {
        let records = vec![complete_record("Asha"), complete_record("Ravi")];
        let pages = render_records(ReportKind::General, &records, &ReportContext::default()).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].plain_text().contains("Asha"));
        assert!(!pages[0].plain_text().contains("Ravi"));
        assert!(pages[1].plain_text().contains("Ravi"));
    }

    #[test]
    fn letterhead_skips_blank_address_lines() {
        let mut ctx = ReportContext::default();
        ctx.settings.hospital_name = "City Clinic".to_string();
        ctx.settings.address_line2 = "Pune 411001".to_string();
        ctx.settings.company_name = "Acme Steel".to_string();
        let mut w = PageWriter::new(ctx.geometry(), BreakPolicy::Strict);
        draw_letterhead(&mut w, &ctx.metrics(), &ctx);
        let text = w.finish()[0].plain_text();
        assert_eq!(text, "City Clinic\nPune 411001\nAcme Steel");
    }

    #[test]
    fn dates_print_day_first() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2026, 3, 9)), "09/03/2026");
        assert_eq!(format_date(None), "");
    }
}
