//! # Export Actions
//!
//! The boundary between the user-facing actions and the layout engine.
//! Application state lives in an [`AppContext`] that is passed explicitly;
//! every export checks the session first, renders the whole document, then
//! hands back the bytes with a generated file name. Failures surface as a
//! [`Notice`] and never as a partial document.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn};

use crate::config::{AppConfig, Credential, HospitalSettings};
use crate::error::ReportError;
use crate::model::{PatientRecord, PrescriptionPad};
use crate::pdf::{DocumentInfo, PdfWriter};
use crate::report::{render_prescription, render_records, ReportContext, ReportKind};

/// Where an unauthenticated export is sent.
pub const LOGIN_ROUTE: &str = "/login";

const PRESCRIPTION_PREFIX: &str = "Prescription";

/// Authentication state for one user of the application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<String>,
}

impl Session {
    /// Accept the login if it matches one of `credentials`.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        credentials: &[Credential],
    ) -> Result<(), ReportError> {
        let accepted = credentials
            .iter()
            .any(|c| c.username == username.trim() && c.password == password);
        if accepted {
            info!(user = username.trim(), "logged in");
            self.user = Some(username.trim().to_string());
            Ok(())
        } else {
            warn!(user = username.trim(), "login rejected");
            self.user = None;
            Err(unauthenticated())
        }
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(%user, "logged out");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn require(&self) -> Result<(), ReportError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(unauthenticated())
        }
    }
}

fn unauthenticated() -> ReportError {
    ReportError::Unauthenticated {
        redirect: LOGIN_ROUTE.to_string(),
    }
}

/// Configuration plus session, passed into every action.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    pub config: AppConfig,
    pub session: Session,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            session: Session::default(),
        }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), ReportError> {
        let credentials = self.config.credentials.clone();
        self.session.login(username, password, &credentials)
    }

    /// Replace the hospital settings used by subsequent exports.
    pub fn update_settings(&mut self, settings: HospitalSettings) {
        info!(hospital = %settings.hospital_name, "settings updated");
        self.config.settings = settings;
    }
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub pages: usize,
}

impl ExportArtifact {
    /// Write into `dir` under the generated file name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let path = dir.join(&self.filename);
        fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "document written");
        Ok(path)
    }
}

/// Render `records` with the `kind` template and serialize to PDF.
pub fn export_pdf(
    ctx: &AppContext,
    kind: ReportKind,
    records: &[PatientRecord],
    now: DateTime<Utc>,
) -> Result<ExportArtifact, ReportError> {
    let _span = info_span!("export_pdf", %kind, records = records.len()).entered();
    ctx.session.require()?;

    let report_ctx = ReportContext::from_config(&ctx.config)?;
    let pages = render_records(kind, records, &report_ctx)?;

    let title = match records {
        [single] => format!("{} - {}", kind.title(), single.name.trim()),
        _ => format!("{} ({} records)", kind.title(), records.len()),
    };
    let info = document_info(&ctx.config, title, now);
    let bytes = PdfWriter::new().write(&pages, &info)?;

    let filename = match records {
        [single] => single_filename(
            kind.file_prefix(),
            &[single.name.as_str(), single.employee_code.as_str()],
            now,
        ),
        _ => batch_filename(kind.file_prefix(), now),
    };
    info!(%filename, pages = pages.len(), bytes = bytes.len(), "export finished");
    Ok(ExportArtifact {
        filename,
        bytes,
        pages: pages.len(),
    })
}

/// Render the prescription pad. A pad without a date is dated `now`.
pub fn export_prescription(
    ctx: &AppContext,
    pad: &PrescriptionPad,
    now: DateTime<Utc>,
) -> Result<ExportArtifact, ReportError> {
    let _span = info_span!("export_prescription").entered();
    ctx.session.require()?;

    let mut pad = pad.clone();
    if pad.date.is_none() {
        pad.date = Some(now.date_naive());
    }
    let report_ctx = ReportContext::from_config(&ctx.config)?;
    let pages = render_prescription(&pad, &report_ctx)?;
    let info = document_info(&ctx.config, "Prescription".to_string(), now);
    let bytes = PdfWriter::new().write(&pages, &info)?;

    let filename = single_filename(PRESCRIPTION_PREFIX, &[pad.patient_name.as_str()], now);
    info!(%filename, "export finished");
    Ok(ExportArtifact {
        filename,
        bytes,
        pages: pages.len(),
    })
}

fn document_info(config: &AppConfig, title: String, now: DateTime<Utc>) -> DocumentInfo {
    let author = config.settings.hospital_name.trim();
    DocumentInfo {
        title: Some(title),
        author: (!author.is_empty()).then(|| author.to_string()),
        subject: Some("Occupational health examination".to_string()),
        creator: Some("medreport".to_string()),
        creation_date: Some(now),
    }
}

/// `{prefix}_{part}_{part}_{YYYYMMDD_HHMMSS}.pdf`, blank parts dropped.
pub fn single_filename(prefix: &str, parts: &[&str], now: DateTime<Utc>) -> String {
    let mut pieces = vec![prefix.to_string()];
    pieces.extend(parts.iter().map(|p| sanitize(p)).filter(|p| !p.is_empty()));
    pieces.push(now.format("%Y%m%d_%H%M%S").to_string());
    format!("{}.pdf", pieces.join("_"))
}

/// `{prefix}_Batch_{YYYY-MM-DD}.pdf`.
pub fn batch_filename(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}_Batch_{}.pdf", prefix, now.format("%Y-%m-%d"))
}

/// Keep letters, digits, `-` and `_`; runs of anything else become one `_`.
pub fn sanitize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for ch in part.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// A user-facing message built from a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    /// Route to navigate to, if the action cannot proceed here.
    pub redirect: Option<String>,
}

impl Notice {
    pub fn from_error(err: &ReportError) -> Self {
        let notice = |title: &str, message: String| Notice {
            title: title.to_string(),
            message,
            redirect: None,
        };
        match err {
            ReportError::Validation { missing } => notice(
                "Missing information",
                format!("Please fill in the required fields: {}", missing.join(", ")),
            ),
            ReportError::Unauthenticated { redirect } => Notice {
                title: "Not logged in".to_string(),
                message: "Please log in to export".to_string(),
                redirect: Some(redirect.clone()),
            },
            ReportError::Chart(detail) => notice(
                "Unable to generate document",
                format!("The audiogram could not be drawn: {}", detail),
            ),
            ReportError::TypeMismatch { field, detail } => notice(
                "Unable to generate document",
                format!("The value of '{}' could not be used: {}", field, detail),
            ),
            ReportError::Import { file, reason } => notice(
                "Import failed",
                format!("{}: {}", file_label(file), reason),
            ),
            ReportError::Export { file, reason } => notice(
                "Export failed",
                format!("{}: {}", file_label(file), reason),
            ),
            ReportError::NotFound(_) => notice("Record not found", err.to_string()),
            ReportError::Config(_) => notice("Invalid settings", err.to_string()),
            ReportError::Render(_)
            | ReportError::Image(_)
            | ReportError::Parse { .. }
            | ReportError::Io(_) => notice("Unable to generate document", err.to_string()),
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
