//! # Record Model
//!
//! The canonical shape of an examination record. Everything the layout
//! engine draws comes from these types; synonym resolution happens earlier,
//! in [`normalize`].
//!
//! Two values are derived and always recomputed from their inputs by
//! [`PatientRecord::refresh_derived`]: body-mass index and expected weight.
//! Ear status is derived on demand and never stored.

pub mod audiometry;
pub mod normalize;
pub mod prescription;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use audiometry::{EarReadings, EarStatus, Hearing, STANDARD_FREQUENCIES};
pub use prescription::PrescriptionPad;

/// Placeholder for clinical findings: "No Abnormality Detected".
pub const NAD: &str = "NAD";

/// One patient's examination record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,

    // ── Identity ───────────────────────────────────────────────
    pub name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub employee_code: String,
    pub certificate_number: String,
    pub department: String,
    pub contractor: String,
    pub contact_number: String,
    pub test_date: Option<NaiveDate>,

    // ── Physiology ─────────────────────────────────────────────
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    /// Derived from height and gender.
    pub expected_weight: Option<f64>,
    pub chest: String,
    /// Derived from height and weight.
    pub bmi: Option<f64>,
    pub bp_systolic: Option<u32>,
    pub bp_diastolic: Option<u32>,
    pub pulse: Option<u32>,

    // ── History ────────────────────────────────────────────────
    pub past_history: Vec<String>,
    pub present_history: Vec<String>,
    pub past_conditions: ConditionFlags,
    pub present_conditions: ConditionFlags,
    pub family_history: FamilyHistory,

    // ── Examination ────────────────────────────────────────────
    pub systemic: SystemicExam,
    pub vision: Vision,
    pub addictions: Addictions,
    pub allergies: String,

    // ── Diagnostics ────────────────────────────────────────────
    pub ecg: String,
    pub xray: String,
    pub pft: String,
    pub audiometry: String,
    pub hearing: Hearing,

    // ── Narrative ──────────────────────────────────────────────
    pub remarks: String,
    pub advice: String,
}

impl Default for PatientRecord {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            created_at: DateTime::<Utc>::default(),
            name: String::new(),
            age: None,
            gender: String::new(),
            employee_code: String::new(),
            certificate_number: String::new(),
            department: String::new(),
            contractor: String::new(),
            contact_number: String::new(),
            test_date: None,
            height_cm: None,
            weight_kg: None,
            expected_weight: None,
            chest: String::new(),
            bmi: None,
            bp_systolic: None,
            bp_diastolic: None,
            pulse: None,
            past_history: vec![String::new()],
            present_history: vec![String::new()],
            past_conditions: ConditionFlags::default(),
            present_conditions: ConditionFlags::default(),
            family_history: FamilyHistory::default(),
            systemic: SystemicExam::default(),
            vision: Vision::default(),
            addictions: Addictions::default(),
            allergies: String::new(),
            ecg: String::new(),
            xray: String::new(),
            pft: String::new(),
            audiometry: String::new(),
            hearing: Hearing::default(),
            remarks: String::new(),
            advice: String::new(),
        }
    }
}

impl PatientRecord {
    /// Recompute derived values and restore list invariants.
    ///
    /// Called on every create, edit-save and import.
    pub fn refresh_derived(&mut self) {
        self.bmi = match (self.height_cm, self.weight_kg) {
            (Some(h), Some(w)) => bmi(h, w),
            _ => None,
        };
        self.expected_weight = self
            .height_cm
            .and_then(|h| expected_weight(h, &self.gender));
        if self.past_history.is_empty() {
            self.past_history.push(String::new());
        }
        if self.present_history.is_empty() {
            self.present_history.push(String::new());
        }
    }

    pub fn right_ear_status(&self) -> EarStatus {
        self.hearing.right.status()
    }

    pub fn left_ear_status(&self) -> EarStatus {
        self.hearing.left.status()
    }

    /// `"120/80"`, or empty when either side is missing.
    pub fn blood_pressure(&self) -> String {
        match (self.bp_systolic, self.bp_diastolic) {
            (Some(s), Some(d)) => format!("{}/{}", s, d),
            _ => String::new(),
        }
    }
}

/// Body-mass index, `weight / (height in m)^2`.
///
/// `None` unless both inputs are strictly positive.
pub fn bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if height_cm <= 0.0 || weight_kg <= 0.0 || !height_cm.is_finite() || !weight_kg.is_finite() {
        return None;
    }
    let h = height_cm / 100.0;
    Some(weight_kg / (h * h))
}

/// Broca-style expected weight: height − 105 for women, height − 100 otherwise.
pub fn expected_weight(height_cm: f64, gender: &str) -> Option<f64> {
    if height_cm <= 0.0 || !height_cm.is_finite() {
        return None;
    }
    if gender.trim().eq_ignore_ascii_case("female") {
        Some(height_cm - 105.0)
    } else {
        Some(height_cm - 100.0)
    }
}

/// Boolean-like condition flags recorded for past and present history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionFlags {
    pub hypertension: bool,
    pub diabetes: bool,
    pub asthma: bool,
    pub chest_pain: bool,
}

impl ConditionFlags {
    /// Names of the flagged conditions, in a fixed order.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.hypertension, "Hypertension"),
            (self.diabetes, "Diabetes"),
            (self.asthma, "Asthma"),
            (self.chest_pain, "Chest Pain"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

/// One parent's history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParentalHistory {
    pub present: bool,
    pub detail: String,
}

impl ParentalHistory {
    /// `"Yes (Diabetes)"`, `"Yes"` or `"No"`.
    pub fn summary(&self) -> String {
        match (self.present, self.detail.trim()) {
            (false, _) => "No".to_string(),
            (true, "") => "Yes".to_string(),
            (true, detail) => format!("Yes ({})", detail),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilyHistory {
    pub father: ParentalHistory,
    pub mother: ParentalHistory,
}

/// Systemic examination findings, one free-text field per body system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemicExam {
    pub respiratory: String,
    pub cardiovascular: String,
    pub nervous: String,
    pub abdominal: String,
}

impl Default for SystemicExam {
    fn default() -> Self {
        Self {
            respiratory: NAD.to_string(),
            cardiovascular: NAD.to_string(),
            nervous: NAD.to_string(),
            abdominal: NAD.to_string(),
        }
    }
}

/// Vision examination. Acuity is kept as written, e.g. `"6/6"` or `"N6"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vision {
    pub color_vision: String,
    pub right_distance: String,
    pub left_distance: String,
    pub right_near: String,
    pub left_near: String,
    pub glasses: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Addictions {
    pub tobacco: bool,
    pub smoking: bool,
    pub drinking: bool,
}

/// `"Yes"` / `"No"`, as printed and exported.
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmi_matches_formula() {
        for (h, w) in [(170.0, 70.0), (155.5, 48.2), (190.0, 102.0)] {
            let expected = w / ((h / 100.0) * (h / 100.0));
            assert!((bmi(h, w).unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn bmi_undefined_for_non_positive_inputs() {
        assert_eq!(bmi(0.0, 70.0), None);
        assert_eq!(bmi(170.0, 0.0), None);
        assert_eq!(bmi(-170.0, 70.0), None);
    }

    #[test]
    fn expected_weight_by_gender() {
        assert_eq!(expected_weight(170.0, "male"), Some(70.0));
        assert_eq!(expected_weight(170.0, "female"), Some(65.0));
        assert_eq!(expected_weight(170.0, "FEMALE"), Some(65.0));
        assert_eq!(expected_weight(170.0, " Female "), Some(65.0));
        assert_eq!(expected_weight(170.0, "unspecified"), Some(70.0));
        assert_eq!(expected_weight(0.0, "male"), None);
    }

    #[test]
    fn refresh_recomputes_and_restores_history() {
        let mut r = PatientRecord {
            height_cm: Some(160.0),
            weight_kg: Some(64.0),
            gender: "Female".to_string(),
            past_history: vec![],
            ..Default::default()
        };
        r.refresh_derived();
        assert!((r.bmi.unwrap() - 25.0).abs() < 1e-9);
        assert_eq!(r.expected_weight, Some(55.0));
        assert_eq!(r.past_history, vec![String::new()]);

        r.weight_kg = None;
        r.refresh_derived();
        assert_eq!(r.bmi, None, "BMI never survives without its inputs");
    }

    #[test]
    fn condition_names_in_fixed_order() {
        let flags = ConditionFlags {
            chest_pain: true,
            hypertension: true,
            ..Default::default()
        };
        assert_eq!(flags.names(), vec!["Hypertension", "Chest Pain"]);
    }

    #[test]
    fn systemic_defaults_to_nad() {
        let exam = SystemicExam::default();
        assert_eq!(exam.respiratory, NAD);
        assert_eq!(exam.abdominal, NAD);
    }

    #[test]
    fn parental_summary() {
        let p = ParentalHistory {
            present: true,
            detail: "Diabetes".to_string(),
        };
        assert_eq!(p.summary(), "Yes (Diabetes)");
        assert_eq!(ParentalHistory::default().summary(), "No");
    }

    #[test]
    fn record_json_uses_camel_case_and_defaults() {
        let r: PatientRecord =
            serde_json::from_str(r#"{ "name": "Asha", "certificateNumber": "C-1" }"#).unwrap();
        assert_eq!(r.certificate_number, "C-1");
        assert_eq!(r.systemic.nervous, NAD);
        assert_eq!(r.present_history.len(), 1);
    }
}
