//! # medreport
//!
//! Occupational-health examination records rendered into page-native PDF
//! reports: a general medical examination, an audiometry report with one
//! audiogram per ear, and a blank prescription pad.
//!
//! Reports are laid out INTO pages. Every primitive (a field row, a table,
//! a chart) is measured first and placed only where it fits, so nothing is
//! sliced across a page boundary after the fact.
//!
//! ## Architecture
//!
//! ```text
//! Records (JSON / CSV / XLSX)
//!       ↓
//!   [model] / [tabular]  : canonical PatientRecord, synonym resolution
//!       ↓
//!   [report]             : template composers, validation, batching
//!       ↓
//!   [layout] + [chart]   : page writer, primitives, audiogram rasters
//!       ↓
//!   [pdf]                : serialize to PDF bytes
//!       ↓
//!   [export]             : session gate, file names, user notices
//! ```

pub mod chart;
pub mod config;
pub mod error;
pub mod export;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod records;
pub mod report;
pub mod style;
pub mod tabular;
pub mod text;

pub use config::AppConfig;
pub use error::ReportError;
pub use export::{export_pdf, export_prescription, AppContext, ExportArtifact, Notice, Session};
pub use model::{PatientRecord, PrescriptionPad};
pub use records::RecordBook;
pub use report::{render_records, ReportContext, ReportKind};

/// Render records straight to PDF bytes, without the session gate.
///
/// Used by tooling and tests that have no logged-in user.
pub fn render_pdf(
    kind: ReportKind,
    records: &[PatientRecord],
    ctx: &ReportContext,
) -> Result<Vec<u8>, ReportError> {
    let pages = render_records(kind, records, ctx)?;
    let info = pdf::DocumentInfo {
        title: Some(kind.title().to_string()),
        author: Some(ctx.settings.hospital_name.clone()),
        ..Default::default()
    };
    pdf::PdfWriter::new().write(&pages, &info)
}
