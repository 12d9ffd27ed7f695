//! # Record Book
//!
//! The list of examination records a clinic works on. Records change only
//! through explicit create / edit-save / delete calls, and every write
//! refreshes the derived fields.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ReportError;
use crate::model::normalize;
use crate::model::PatientRecord;

/// An ordered, in-memory collection of records.
#[derive(Debug, Clone, Default)]
pub struct RecordBook {
    records: Vec<PatientRecord>,
}

impl RecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from already-parsed records, e.g. a spreadsheet import.
    pub fn from_records(records: Vec<PatientRecord>, now: DateTime<Utc>) -> Self {
        let mut book = Self::new();
        for record in records {
            book.create(record, now);
        }
        book
    }

    /// Add a record, assigning an id and creation time when it has none.
    pub fn create(&mut self, mut record: PatientRecord, now: DateTime<Utc>) -> Uuid {
        if record.id.is_nil() || self.position(record.id).is_some() {
            record.id = Uuid::new_v4();
        }
        if record.created_at == DateTime::<Utc>::default() {
            record.created_at = now;
        }
        record.refresh_derived();
        let id = record.id;
        debug!(%id, name = %record.name, "record created");
        self.records.push(record);
        id
    }

    /// Explicit edit-save. Identity and creation time are kept.
    pub fn update(&mut self, id: Uuid, mut record: PatientRecord) -> Result<(), ReportError> {
        let idx = self.position(id).ok_or(ReportError::NotFound(id))?;
        let existing = &mut self.records[idx];
        record.id = existing.id;
        record.created_at = existing.created_at;
        record.refresh_derived();
        *existing = record;
        debug!(%id, "record updated");
        Ok(())
    }

    pub fn delete(&mut self, id: Uuid) -> Result<PatientRecord, ReportError> {
        let idx = self.position(id).ok_or(ReportError::NotFound(id))?;
        debug!(%id, "record deleted");
        Ok(self.records.remove(idx))
    }

    pub fn get(&self, id: Uuid) -> Option<&PatientRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// All records in insertion order.
    pub fn list(&self) -> &[PatientRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive match on name, employee code or certificate number.
    pub fn search(&self, query: &str) -> Vec<&PatientRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.records.iter().collect();
        }
        self.records
            .iter()
            .filter(|r| {
                [&r.name, &r.employee_code, &r.certificate_number]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Load a JSON array of records (synonym fields accepted).
    pub fn load_json(path: &Path, now: DateTime<Utc>) -> Result<Self, ReportError> {
        let json = fs::read_to_string(path)?;
        let records = normalize::records_from_json(&json)?;
        info!(path = %path.display(), count = records.len(), "records loaded");
        Ok(Self::from_records(records, now))
    }

    /// Write the book as a pretty-printed JSON array.
    pub fn save_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, json)?;
        info!(path = %path.display(), count = self.records.len(), "records saved");
        Ok(())
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap()
    }

    fn record(name: &str) -> PatientRecord {
        PatientRecord {
            name: name.to_string(),
            height_cm: Some(180.0),
            weight_kg: Some(81.0),
            ..Default::default()
        }
    }

    #[test]
    fn create_assigns_identity_and_derived_values() {
        let mut book = RecordBook::new();
        let id = book.create(record("Meera"), now());
        let r = book.get(id).unwrap();
        assert!(!r.id.is_nil());
        assert_eq!(r.created_at, now());
        assert!((r.bmi.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn update_keeps_identity_and_recomputes() {
        let mut book = RecordBook::new();
        let id = book.create(record("Meera"), now());
        let mut edited = record("Meera K");
        edited.weight_kg = Some(64.8);
        edited.bmi = Some(99.0);
        book.update(id, edited).unwrap();

        let r = book.get(id).unwrap();
        assert_eq!(r.name, "Meera K");
        assert_eq!(r.created_at, now());
        assert!((r.bmi.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn delete_and_not_found() {
        let mut book = RecordBook::new();
        let id = book.create(record("A"), now());
        book.create(record("B"), now());
        assert_eq!(book.delete(id).unwrap().name, "A");
        assert_eq!(book.len(), 1);
        assert!(matches!(book.delete(id), Err(ReportError::NotFound(_))));
        assert!(matches!(
            book.update(id, record("A")),
            Err(ReportError::NotFound(_))
        ));
    }

    #[test]
    fn list_keeps_insertion_order() {
        let book = RecordBook::from_records(vec![record("Z"), record("A"), record("M")], now());
        let names: Vec<&str> = book.list().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Z", "A", "M"]);
    }

    #[test]
    fn search_matches_code_and_certificate() {
        let mut book = RecordBook::new();
        let mut a = record("Anil");
        a.employee_code = "EMP-007".to_string();
        let mut b = record("Bina");
        b.certificate_number = "CERT-19".to_string();
        book.create(a, now());
        book.create(b, now());

        assert_eq!(book.search("emp-007")[0].name, "Anil");
        assert_eq!(book.search("cert")[0].name, "Bina");
        assert_eq!(book.search("  ").len(), 2);
    }

    #[test]
    fn json_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let book = RecordBook::from_records(vec![record("Asha"), record("Ravi")], now());
        book.save_json(&path).unwrap();

        let loaded = RecordBook::load_json(&path, now()).unwrap();
        assert_eq!(loaded.list(), book.list());
    }
}
