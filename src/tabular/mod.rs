//! # Tabular Import and Export
//!
//! Spreadsheets are read into a plain grid of strings first (CSV through
//! `csv`, workbooks through `calamine`), then every row is mapped onto a
//! [`PatientRecord`] using the column registry in [`columns`]. Export goes
//! the other way with the canonical headers, as CSV or as an xlsx workbook
//! with one "Medical Reports" sheet, so an exported file imports back to
//! the same values.

pub mod columns;

use std::io;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::{debug, info, info_span, warn};

use crate::error::ReportError;
use crate::model::{PatientRecord, STANDARD_FREQUENCIES};
use columns::{hearing_column, Side, TabColumn, COLUMNS};

/// Extensions handed to `calamine`.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Sheet name used for workbook exports.
pub const EXPORT_SHEET: &str = "Medical Reports";

/// Spreadsheet flavours [`export_file`] can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// `.xlsx` selects a workbook; anything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => TableFormat::Xlsx,
            _ => TableFormat::Csv,
        }
    }
}

/// The outcome of importing one file of a multi-file selection.
#[derive(Debug)]
pub struct FileImport {
    pub path: PathBuf,
    pub result: Result<Vec<PatientRecord>, ReportError>,
}

/// Where one input column goes.
#[derive(Clone, Copy)]
enum Target {
    Column(&'static TabColumn),
    Hearing(Side, u32),
    Ignored,
}

/// Read every record from a CSV or spreadsheet file.
pub fn import_file(path: &Path) -> Result<Vec<PatientRecord>, ReportError> {
    let _span = info_span!("import_file", path = %path.display()).entered();
    let grid = read_grid(path)?;
    let records = records_from_grid(path, &grid)?;
    info!(count = records.len(), "records imported");
    Ok(records)
}

/// Import several files. A failing file does not stop the others.
pub fn import_files(paths: &[PathBuf]) -> Vec<FileImport> {
    paths
        .iter()
        .map(|path| {
            let result = import_file(path);
            if let Err(e) = &result {
                warn!(path = %path.display(), error = %e, "file import failed");
            }
            FileImport {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

fn import_error(path: &Path, reason: impl Into<String>) -> ReportError {
    ReportError::Import {
        file: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn read_grid(path: &Path) -> Result<Vec<Vec<String>>, ReportError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if extension == "csv" {
        read_csv(path)
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook(path)
    } else {
        Err(import_error(
            path,
            format!("unsupported file type '.{}' (expected csv, xlsx, xls or ods)", extension),
        ))
    }
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| import_error(path, e.to_string()))?;
    reader
        .records()
        .map(|row| {
            row.map(|row| row.iter().map(str::to_string).collect())
                .map_err(|e| import_error(path, e.to_string()))
        })
        .collect()
}

/// First worksheet only.
fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>, ReportError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| import_error(path, e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| import_error(path, "workbook has no sheets"))?
        .map_err(|e| import_error(path, e.to_string()))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => crate::model::yes_no(*b).to_string(),
        // Serial day number; the date parser understands these.
        Data::DateTime(dt) => float_text(dt.as_f64()),
    }
}

fn float_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn resolve_header(header: &str) -> Target {
    let key = header.trim().to_lowercase();
    if key.is_empty() {
        return Target::Ignored;
    }
    if let Some(column) = COLUMNS.iter().find(|c| c.matches(&key)) {
        return Target::Column(column);
    }
    match hearing_column(&key) {
        Some((side, frequency)) => Target::Hearing(side, frequency),
        None => Target::Ignored,
    }
}

/// Map the grid onto records. The first row is the header.
fn records_from_grid(path: &Path, grid: &[Vec<String>]) -> Result<Vec<PatientRecord>, ReportError> {
    let Some((header, rows)) = grid.split_first() else {
        return Err(import_error(path, "file is empty"));
    };
    let targets: Vec<Target> = header.iter().map(|h| resolve_header(h)).collect();
    for (h, t) in header.iter().zip(&targets) {
        if matches!(t, Target::Ignored) && !h.trim().is_empty() {
            debug!(column = %h, "unrecognised column ignored");
        }
    }
    if targets.iter().all(|t| matches!(t, Target::Ignored)) {
        return Err(import_error(path, "no recognised column headers"));
    }

    let mut records = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        // Spreadsheet row number: header is row 1.
        let line = index + 2;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match record_from_row(&targets, header, row) {
            Ok(record) => records.push(record),
            Err(reason) => warn!(row = line, %reason, "row skipped"),
        }
    }
    if records.is_empty() {
        return Err(import_error(path, "no records found"));
    }
    Ok(records)
}

fn record_from_row(targets: &[Target], header: &[String], row: &[String]) -> Result<PatientRecord, String> {
    let mut record = PatientRecord::default();
    for ((target, name), cell) in targets.iter().zip(header).zip(row) {
        let value = cell.trim();
        if value.is_empty() && !matches!(target, Target::Column(c) if c.text) {
            continue;
        }
        match target {
            Target::Column(column) => {
                if let Some(set) = column.set {
                    set(&mut record, value).map_err(|e| format!("{}: {}", name.trim(), e))?;
                }
            }
            Target::Hearing(side, frequency) => {
                let level = crate::model::normalize::leading_number(value)
                    .ok_or_else(|| format!("{}: '{}' is not a number", name.trim(), value))?;
                let ear = match side {
                    Side::Right => &mut record.hearing.right,
                    Side::Left => &mut record.hearing.left,
                };
                ear.set(*frequency, level.round() as i32);
            }
            Target::Ignored => {}
        }
    }
    record.refresh_derived();
    Ok(record)
}

/// Canonical headers in export order.
pub fn export_headers() -> Vec<String> {
    let mut headers: Vec<String> = COLUMNS.iter().map(|c| c.header.to_string()).collect();
    for side in [Side::Right, Side::Left] {
        for f in STANDARD_FREQUENCIES {
            headers.push(format!("{} {}", side.label(), f));
        }
    }
    headers
}

fn export_row(record: &PatientRecord) -> Vec<String> {
    let mut row: Vec<String> = COLUMNS.iter().map(|c| (c.get)(record)).collect();
    for ear in [&record.hearing.right, &record.hearing.left] {
        for f in STANDARD_FREQUENCIES {
            row.push(ear.get(f).map(|db| db.to_string()).unwrap_or_default());
        }
    }
    row
}

/// Write `records` as CSV with the canonical headers.
pub fn export_csv<W: io::Write>(records: &[PatientRecord], writer: W) -> Result<(), ReportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(export_headers())
        .map_err(|e| ReportError::Io(e.into()))?;
    for record in records {
        out.write_record(export_row(record))
            .map_err(|e| ReportError::Io(e.into()))?;
    }
    out.flush()?;
    debug!(count = records.len(), "records exported");
    Ok(())
}

/// Write `records` as a workbook with a single [`EXPORT_SHEET`].
///
/// Every cell is written as text so values come back unchanged on import.
pub fn export_xlsx(records: &[PatientRecord], path: &Path) -> Result<(), ReportError> {
    let _span = info_span!("export_xlsx", path = %path.display()).entered();
    let export_error = |e: XlsxError| ReportError::Export {
        file: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET).map_err(export_error)?;
    for (col, header) in export_headers().iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, header, &bold)
            .map_err(export_error)?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, value) in export_row(record).iter().enumerate() {
            if !value.is_empty() {
                sheet
                    .write_string(row, col as u16, value)
                    .map_err(export_error)?;
            }
        }
    }
    workbook.save(path).map_err(export_error)?;
    debug!(count = records.len(), "records exported");
    Ok(())
}

/// Write `records` to `path`, choosing the format from its extension.
pub fn export_file(records: &[PatientRecord], path: &Path) -> Result<TableFormat, ReportError> {
    let format = TableFormat::from_path(path);
    match format {
        TableFormat::Xlsx => export_xlsx(records, path)?,
        TableFormat::Csv => export_csv(records, std::fs::File::create(path)?)?,
    }
    Ok(format)
}
