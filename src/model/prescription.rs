//! Inputs for the prescription letterhead.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Letterhead and patient row for a blank prescription pad.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrescriptionPad {
    pub hospital_name: String,
    pub doctor_name: String,
    pub qualification: String,
    pub registration_number: String,
    pub address: String,
    pub phone: String,
    pub timings: String,

    pub patient_name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub date: Option<NaiveDate>,
}

impl PrescriptionPad {
    /// Labels of the required letterhead fields that are blank.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("Hospital Name", &self.hospital_name),
            ("Doctor Name", &self.doctor_name),
            ("Address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label.to_string())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_blank_letterhead_fields() {
        let pad = PrescriptionPad {
            hospital_name: "City Clinic".to_string(),
            doctor_name: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(pad.missing_fields(), vec!["Doctor Name", "Address"]);
    }
}
