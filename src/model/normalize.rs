//! # Normalization
//!
//! Records arrive from forms, older exports and spreadsheets with the same
//! field under different names (`sex` for `gender`, `empId` for
//! `employeeCode`, ...) and with numbers written as text. This module folds
//! all of that into one canonical [`PatientRecord`] before any layout code
//! sees it.

use chrono::{Duration, NaiveDate};
use serde_json::{Map, Value};

use super::PatientRecord;
use crate::error::ReportError;

/// Canonical top-level key and the synonyms that resolve to it.
///
/// The canonical key always wins when both are present.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("gender", &["sex"]),
    ("employeeCode", &["empCode", "empId", "employeeId", "emp_code", "emp_id", "employee_code"]),
    ("certificateNumber", &["certificateNo", "certNo", "certificate_no", "cert_no", "certificate_number"]),
    ("contactNumber", &["contact", "phone", "mobile", "contact_number"]),
    ("testDate", &["date", "examDate", "test_date", "exam_date"]),
    ("heightCm", &["height", "height_cm"]),
    ("weightKg", &["weight", "weight_kg"]),
    ("bpSystolic", &["systolic", "bp_systolic"]),
    ("bpDiastolic", &["diastolic", "bp_diastolic"]),
    ("pastHistory", &["past_history"]),
    ("presentHistory", &["present_history"]),
    ("xray", &["xRay", "x_ray"]),
    ("pft", &["pulmonaryFunction", "pulmonary_function"]),
    ("remarks", &["remark"]),
];

const INTEGER_KEYS: &[&str] = &["age", "bpSystolic", "bpDiastolic", "pulse"];
const DECIMAL_KEYS: &[&str] = &["heightCm", "weightKg"];
const HISTORY_KEYS: &[&str] = &["pastHistory", "presentHistory"];

/// Parse one record from loosely-shaped JSON.
pub fn from_json_value(value: Value) -> Result<PatientRecord, ReportError> {
    let Value::Object(object) = value else {
        return Err(ReportError::TypeMismatch {
            field: "record".to_string(),
            detail: "expected a JSON object".to_string(),
        });
    };
    let canonical = canonicalize(object)?;
    let mut record: PatientRecord = serde_json::from_value(Value::Object(canonical))?;
    record.refresh_derived();
    Ok(record)
}

/// Parse a JSON document holding either one record or an array of records.
pub fn records_from_json(json: &str) -> Result<Vec<PatientRecord>, ReportError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items.into_iter().map(from_json_value).collect(),
        other => Ok(vec![from_json_value(other)?]),
    }
}

fn canonicalize(mut object: Map<String, Value>) -> Result<Map<String, Value>, ReportError> {
    for (canonical, synonyms) in SYNONYMS {
        for synonym in *synonyms {
            if let Some(value) = object.remove(*synonym) {
                let missing = object.get(*canonical).map_or(true, is_blank);
                if missing && !is_blank(&value) {
                    object.insert((*canonical).to_string(), value);
                }
            }
        }
    }

    // "bp": "120/80" splits into the two canonical halves
    for key in ["bp", "bloodPressure", "blood_pressure"] {
        if let Some(value) = object.remove(key) {
            if let Some((sys, dia)) = value.as_str().and_then(split_blood_pressure) {
                object.entry("bpSystolic").or_insert(Value::from(sys));
                object.entry("bpDiastolic").or_insert(Value::from(dia));
            }
        }
    }

    for key in INTEGER_KEYS {
        coerce(&mut object, key, |s| {
            leading_number(s).map(|n| Value::from(n.round().max(0.0) as u64))
        })?;
    }
    for key in DECIMAL_KEYS {
        coerce(&mut object, key, |s| leading_number(s).map(Value::from))?;
    }
    coerce(&mut object, "testDate", |s| {
        parse_date(s).map(|d| Value::from(d.format("%Y-%m-%d").to_string()))
    })?;

    for key in HISTORY_KEYS {
        if let Some(Value::String(s)) = object.get(*key) {
            let items = split_history(s);
            object.insert((*key).to_string(), Value::from(items));
        }
    }

    // Nulls mean "not provided"; let serde fall back to the defaults.
    object.retain(|_, v| !v.is_null());
    Ok(object)
}

/// Replace a string value at `key` with its parsed form; blank strings become null.
fn coerce<F>(object: &mut Map<String, Value>, key: &str, parse: F) -> Result<(), ReportError>
where
    F: Fn(&str) -> Option<Value>,
{
    if let Some(Value::String(raw)) = object.get(key) {
        let raw = raw.trim().to_string();
        let parsed = if raw.is_empty() {
            Value::Null
        } else {
            parse(&raw).ok_or_else(|| ReportError::TypeMismatch {
                field: key.to_string(),
                detail: format!("cannot read '{}'", raw),
            })?
        };
        object.insert(key.to_string(), parsed);
    }
    Ok(())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// The first number in `s`, ignoring units: `"170 cm"` → 170.0.
pub fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let start = s.find(|c: char| c.is_ascii_digit() || c == '-' || c == '.')?;
    let rest = &s[start..];
    let end = rest
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (c == '-' && i == 0)))
        .map_or(rest.len(), |(i, _)| i);
    rest[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `"120/80"` → `(120, 80)`.
pub fn split_blood_pressure(s: &str) -> Option<(u32, u32)> {
    let (sys, dia) = s.split_once('/')?;
    let sys = leading_number(sys)?;
    let dia = leading_number(dia)?;
    if sys < 0.0 || dia < 0.0 {
        return None;
    }
    Some((sys.round() as u32, dia.round() as u32))
}

/// Yes/no style booleans as they appear in forms and spreadsheets.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "present" => Some(true),
        "no" | "n" | "false" | "0" | "absent" | "" => Some(false),
        _ => None,
    }
}

/// Dates as written on forms: ISO, day-first with `/`, `-` or `.`, or an
/// Excel serial day number.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    // "2026-10-17T09:30:00" and similar timestamps
    if s.len() > 10 && s.is_char_boundary(10) {
        if let Ok(date) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(date);
        }
    }
    s.parse::<f64>().ok().and_then(excel_serial_date)
}

/// Excel's 1900 date system, counted from 1899-12-30.
pub fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// `"Asthma; Fracture"` → `["Asthma", "Fracture"]`, never empty.
pub fn split_history(s: &str) -> Vec<String> {
    let items: Vec<String> = s
        .split(';')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
    if items.is_empty() {
        vec![String::new()]
    } else {
        items
    }
}
