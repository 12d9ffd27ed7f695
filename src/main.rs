//! # medreport CLI
//!
//! Usage:
//!   medreport --user clinic --password secret render general records.json -o out/
//!   medreport --user clinic --password secret render audiometry batch.xlsx
//!   medreport --user clinic --password secret prescription pad.json
//!   medreport import a.xlsx b.csv -o records.json
//!   medreport export-table records.json -o records.csv
//!   medreport example > records.json

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use medreport::model::{EarReadings, Hearing};
use medreport::{
    export_pdf, export_prescription, tabular, AppConfig, AppContext, Notice, PatientRecord,
    PrescriptionPad, RecordBook, ReportError, ReportKind,
};

/// Examination records and PDF reports for occupational-health clinics.
#[derive(Parser)]
#[command(name = "medreport", version, about)]
struct Cli {
    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log in as this user before exporting.
    #[arg(long, global = true)]
    user: Option<String>,

    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Template {
    General,
    Audiometry,
}

impl From<Template> for ReportKind {
    fn from(t: Template) -> Self {
        match t {
            Template::General => ReportKind::General,
            Template::Audiometry => ReportKind::Audiometry,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Render one PDF from records in JSON, CSV or spreadsheet files.
    Render {
        #[arg(value_enum)]
        template: Template,
        /// Input files; all records go into one document, in order.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Render a blank prescription pad.
    Prescription {
        /// Pad JSON; blank fields come from the configuration.
        input: Option<PathBuf>,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Convert spreadsheets into a records JSON file.
    Import {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Write here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a records JSON file as CSV, or as xlsx when the output ends in `.xlsx`.
    ExportTable {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print sample records as JSON.
    Example,
}

fn main() {
    // Set RUST_LOG=debug for page-break and chart detail.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        match e.downcast_ref::<ReportError>() {
            Some(err) => {
                let notice = Notice::from_error(err);
                eprintln!("{}: {}", notice.title, notice.message);
            }
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut ctx = AppContext::new(config);
    if let Some(user) = &cli.user {
        ctx.login(user, cli.password.as_deref().unwrap_or_default())?;
    }
    let now = Utc::now();

    match cli.command {
        Command::Render {
            template,
            inputs,
            output,
        } => {
            let records = read_records(&inputs)?;
            let artifact = export_pdf(&ctx, template.into(), &records, now)?;
            let path = artifact.write_to(&output)?;
            eprintln!("Written {} page(s) to {}", artifact.pages, path.display());
        }
        Command::Prescription { input, output } => {
            let pad = match input {
                Some(path) => {
                    let json = fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str::<PrescriptionPad>(&json).map_err(ReportError::from)?
                }
                None => PrescriptionPad::default(),
            };
            let artifact = export_prescription(&ctx, &pad, now)?;
            let path = artifact.write_to(&output)?;
            eprintln!("Written {}", path.display());
        }
        Command::Import { inputs, output } => {
            let mut records = Vec::new();
            for file in tabular::import_files(&inputs) {
                match file.result {
                    Ok(mut imported) => records.append(&mut imported),
                    Err(e) => {
                        let notice = Notice::from_error(&e);
                        eprintln!("{}: {}", notice.title, notice.message);
                    }
                }
            }
            if records.is_empty() {
                bail!("no records imported");
            }
            let book = RecordBook::from_records(records, now);
            match output {
                Some(path) => book.save_json(&path)?,
                None => println!("{}", serde_json::to_string_pretty(book.list())?),
            }
        }
        Command::ExportTable { input, output } => {
            let book = RecordBook::load_json(&input, now)?;
            match output {
                Some(path) => {
                    let format = tabular::export_file(book.list(), &path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), ?format, "table written");
                }
                None => tabular::export_csv(book.list(), io::stdout().lock())?,
            }
        }
        Command::Example => {
            println!("{}", serde_json::to_string_pretty(&sample_records())?);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match AppConfig::default_path() {
            Some(p) => p,
            None => return Ok(AppConfig::default()),
        },
    };
    AppConfig::load(&path).with_context(|| format!("loading config {}", path.display()))
}

/// JSON files through the record book, everything else through the
/// spreadsheet importer.
fn read_records(inputs: &[PathBuf]) -> Result<Vec<PatientRecord>> {
    let now = Utc::now();
    let mut records = Vec::new();
    for path in inputs {
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            let book = RecordBook::load_json(path, now)?;
            records.extend(book.list().iter().cloned());
        } else {
            records.extend(tabular::import_file(path)?);
        }
    }
    Ok(records)
}

fn sample_records() -> Vec<PatientRecord> {
    let mut asha = PatientRecord {
        name: "Asha Kulkarni".to_string(),
        age: Some(34),
        gender: "Female".to_string(),
        employee_code: "E-1042".to_string(),
        certificate_number: "OHC/2026/118".to_string(),
        department: "Rolling Mill".to_string(),
        contractor: "Shree Services".to_string(),
        test_date: NaiveDate::from_ymd_opt(2026, 10, 17),
        height_cm: Some(160.0),
        weight_kg: Some(58.5),
        bp_systolic: Some(118),
        bp_diastolic: Some(76),
        pulse: Some(72),
        ecg: "Normal sinus rhythm".to_string(),
        xray: "NAD".to_string(),
        pft: "Normal".to_string(),
        hearing: Hearing {
            right: EarReadings::from_levels([15, 10, 15, 20, 15, 20]),
            left: EarReadings::from_levels([10, 10, 15, 25, 20, 20]),
        },
        remarks: "Fit for duty.".to_string(),
        advice: "Use hearing protection in the mill.".to_string(),
        ..Default::default()
    };
    asha.refresh_derived();

    let mut ravi = PatientRecord {
        name: "Ravi Patil".to_string(),
        age: Some(47),
        gender: "Male".to_string(),
        employee_code: "E-0917".to_string(),
        certificate_number: "OHC/2026/119".to_string(),
        department: "Forging".to_string(),
        test_date: NaiveDate::from_ymd_opt(2026, 10, 17),
        height_cm: Some(172.0),
        weight_kg: Some(81.0),
        hearing: Hearing {
            right: EarReadings::from_levels([20, 25, 30, 55, 50, 40]),
            left: EarReadings::from_levels([15, 20, 25, 45, 40, 35]),
        },
        audiometry: "Noise-induced dip at 4 kHz, right ear.".to_string(),
        remarks: "Fit with restrictions.".to_string(),
        advice: "Annual audiometry; double hearing protection.".to_string(),
        ..Default::default()
    };
    ravi.present_conditions.hypertension = true;
    ravi.addictions.tobacco = true;
    ravi.refresh_derived();

    vec![asha, ravi]
}
