//! Spreadsheet column registry.
//!
//! Each logical column has one canonical header (used on export) and a list
//! of accepted synonyms (matched on import after trimming and lower-casing).
//! Hearing levels are not listed here; they are recognised by shape, see
//! [`hearing_column`].

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::model::normalize::{leading_number, parse_bool, parse_date, split_blood_pressure, split_history};
use crate::model::{yes_no, PatientRecord};

type Getter = fn(&PatientRecord) -> String;
type Setter = fn(&mut PatientRecord, &str) -> Result<(), String>;

pub struct TabColumn {
    pub header: &'static str,
    pub synonyms: &'static [&'static str],
    pub get: Getter,
    /// Free text: an empty cell clears the field instead of leaving its
    /// default in place.
    pub text: bool,
    /// `None` for derived values that are exported but recomputed on import.
    pub set: Option<Setter>,
}

impl TabColumn {
    /// Whether `header` (already trimmed and lower-cased) names this column.
    pub fn matches(&self, header: &str) -> bool {
        self.header.eq_ignore_ascii_case(header) || self.synonyms.iter().any(|s| *s == header)
    }
}

fn number(v: &str) -> Result<f64, String> {
    leading_number(v).ok_or_else(|| format!("'{}' is not a number", v))
}

fn whole(v: &str) -> Result<u32, String> {
    let n = number(v)?;
    if n < 0.0 {
        return Err(format!("'{}' cannot be negative", v));
    }
    Ok(n.round() as u32)
}

fn flag(v: &str) -> Result<bool, String> {
    parse_bool(v).ok_or_else(|| format!("'{}' is not yes or no", v))
}

fn day(v: &str) -> Result<NaiveDate, String> {
    parse_date(v).ok_or_else(|| format!("'{}' is not a date", v))
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn iso(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn one_decimal(v: Option<f64>) -> String {
    v.map(|v| format!("{:.1}", v)).unwrap_or_default()
}

pub const COLUMNS: &[TabColumn] = &[
    TabColumn {
        header: "ID",
        synonyms: &["id", "record id"],
        text: false,
        get: |r| r.id.to_string(),
        set: Some(|r, v| {
            r.id = Uuid::parse_str(v).map_err(|e| e.to_string())?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Created At",
        synonyms: &["created", "created_at", "createdat"],
        text: false,
        get: |r| r.created_at.to_rfc3339(),
        set: Some(|r, v| {
            r.created_at = DateTime::parse_from_rfc3339(v)
                .map_err(|e| e.to_string())?
                .with_timezone(&Utc);
            Ok(())
        }),
    },
    TabColumn {
        header: "Name",
        synonyms: &["patient name", "employee name", "full name"],
        text: true,
        get: |r| r.name.clone(),
        set: Some(|r, v| {
            r.name = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Age",
        synonyms: &["age (years)", "age in years"],
        text: false,
        get: |r| opt(r.age),
        set: Some(|r, v| {
            r.age = Some(whole(v)?);
            Ok(())
        }),
    },
    TabColumn {
        header: "Gender",
        synonyms: &["sex", "m/f"],
        text: true,
        get: |r| r.gender.clone(),
        set: Some(|r, v| {
            r.gender = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Employee Code",
        synonyms: &["emp code", "emp id", "employee id", "empcode", "empid", "employee_code", "emp_code"],
        text: true,
        get: |r| r.employee_code.clone(),
        set: Some(|r, v| {
            r.employee_code = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Certificate Number",
        synonyms: &["certificate no", "certificate no.", "cert no", "cert no.", "certificate_number"],
        text: true,
        get: |r| r.certificate_number.clone(),
        set: Some(|r, v| {
            r.certificate_number = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Department",
        synonyms: &["dept", "dept."],
        text: true,
        get: |r| r.department.clone(),
        set: Some(|r, v| {
            r.department = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Contractor",
        synonyms: &["contractor name", "agency"],
        text: true,
        get: |r| r.contractor.clone(),
        set: Some(|r, v| {
            r.contractor = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Contact Number",
        synonyms: &["contact", "contact no", "phone", "mobile", "mobile no"],
        text: true,
        get: |r| r.contact_number.clone(),
        set: Some(|r, v| {
            r.contact_number = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Test Date",
        synonyms: &["date", "exam date", "examination date", "date of test"],
        text: false,
        get: |r| iso(r.test_date),
        set: Some(|r, v| {
            r.test_date = Some(day(v)?);
            Ok(())
        }),
    },
    TabColumn {
        header: "Height (cm)",
        synonyms: &["height", "height cm", "ht"],
        text: false,
        get: |r| opt(r.height_cm),
        set: Some(|r, v| {
            r.height_cm = Some(number(v)?);
            Ok(())
        }),
    },
    TabColumn {
        header: "Weight (kg)",
        synonyms: &["weight", "weight kg", "wt"],
        text: false,
        get: |r| opt(r.weight_kg),
        set: Some(|r, v| {
            r.weight_kg = Some(number(v)?);
            Ok(())
        }),
    },
    TabColumn {
        header: "BMI",
        synonyms: &[],
        text: false,
        get: |r| one_decimal(r.bmi),
        set: None,
    },
    TabColumn {
        header: "Expected Weight (kg)",
        synonyms: &["expected weight"],
        text: false,
        get: |r| one_decimal(r.expected_weight),
        set: None,
    },
    TabColumn {
        header: "Chest",
        synonyms: &["chest (cm)", "chest expansion"],
        text: true,
        get: |r| r.chest.clone(),
        set: Some(|r, v| {
            r.chest = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Blood Pressure",
        synonyms: &["bp", "b.p.", "bp (mmhg)"],
        text: false,
        get: |r| r.blood_pressure(),
        set: Some(|r, v| {
            let (sys, dia) =
                split_blood_pressure(v).ok_or_else(|| format!("'{}' is not systolic/diastolic", v))?;
            r.bp_systolic = Some(sys);
            r.bp_diastolic = Some(dia);
            Ok(())
        }),
    },
    TabColumn {
        header: "Systolic",
        synonyms: &["bp systolic", "systolic bp"],
        text: false,
        get: |r| opt(r.bp_systolic),
        set: Some(|r, v| {
            r.bp_systolic = Some(whole(v)?);
            Ok(())
        }),
    },
    TabColumn {
        header: "Diastolic",
        synonyms: &["bp diastolic", "diastolic bp"],
        text: false,
        get: |r| opt(r.bp_diastolic),
        set: Some(|r, v| {
            r.bp_diastolic = Some(whole(v)?);
            Ok(())
        }),
    },
    TabColumn {
        header: "Pulse",
        synonyms: &["pulse rate", "heart rate"],
        text: false,
        get: |r| opt(r.pulse),
        set: Some(|r, v| {
            r.pulse = Some(whole(v)?);
            Ok(())
        }),
    },
    TabColumn {
        header: "Past History",
        synonyms: &["past medical history", "past_history"],
        text: true,
        get: |r| join_history(&r.past_history),
        set: Some(|r, v| {
            r.past_history = split_history(v);
            Ok(())
        }),
    },
    TabColumn {
        header: "Present History",
        synonyms: &["present complaints", "present_history"],
        text: true,
        get: |r| join_history(&r.present_history),
        set: Some(|r, v| {
            r.present_history = split_history(v);
            Ok(())
        }),
    },
    TabColumn {
        header: "Past Hypertension",
        synonyms: &[],
        text: false,
        get: |r| yes_no(r.past_conditions.hypertension).to_string(),
        set: Some(|r, v| {
            r.past_conditions.hypertension = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Past Diabetes",
        synonyms: &[],
        text: false,
        get: |r| yes_no(r.past_conditions.diabetes).to_string(),
        set: Some(|r, v| {
            r.past_conditions.diabetes = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Past Asthma",
        synonyms: &[],
        text: false,
        get: |r| yes_no(r.past_conditions.asthma).to_string(),
        set: Some(|r, v| {
            r.past_conditions.asthma = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Past Chest Pain",
        synonyms: &[],
        text: false,
        get: |r| yes_no(r.past_conditions.chest_pain).to_string(),
        set: Some(|r, v| {
            r.past_conditions.chest_pain = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Present Hypertension",
        synonyms: &["hypertension"],
        text: false,
        get: |r| yes_no(r.present_conditions.hypertension).to_string(),
        set: Some(|r, v| {
            r.present_conditions.hypertension = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Present Diabetes",
        synonyms: &["diabetes"],
        text: false,
        get: |r| yes_no(r.present_conditions.diabetes).to_string(),
        set: Some(|r, v| {
            r.present_conditions.diabetes = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Present Asthma",
        synonyms: &["asthma"],
        text: false,
        get: |r| yes_no(r.present_conditions.asthma).to_string(),
        set: Some(|r, v| {
            r.present_conditions.asthma = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Present Chest Pain",
        synonyms: &["chest pain"],
        text: false,
        get: |r| yes_no(r.present_conditions.chest_pain).to_string(),
        set: Some(|r, v| {
            r.present_conditions.chest_pain = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Father History",
        synonyms: &["father"],
        text: false,
        get: |r| yes_no(r.family_history.father.present).to_string(),
        set: Some(|r, v| {
            r.family_history.father.present = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Father Details",
        synonyms: &["father detail"],
        text: true,
        get: |r| r.family_history.father.detail.clone(),
        set: Some(|r, v| {
            r.family_history.father.detail = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Mother History",
        synonyms: &["mother"],
        text: false,
        get: |r| yes_no(r.family_history.mother.present).to_string(),
        set: Some(|r, v| {
            r.family_history.mother.present = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Mother Details",
        synonyms: &["mother detail"],
        text: true,
        get: |r| r.family_history.mother.detail.clone(),
        set: Some(|r, v| {
            r.family_history.mother.detail = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Respiratory",
        synonyms: &["respiratory system", "rs"],
        text: true,
        get: |r| r.systemic.respiratory.clone(),
        set: Some(|r, v| {
            r.systemic.respiratory = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Cardiovascular",
        synonyms: &["cardiovascular system", "cvs"],
        text: true,
        get: |r| r.systemic.cardiovascular.clone(),
        set: Some(|r, v| {
            r.systemic.cardiovascular = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Nervous System",
        synonyms: &["nervous", "cns"],
        text: true,
        get: |r| r.systemic.nervous.clone(),
        set: Some(|r, v| {
            r.systemic.nervous = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Abdominal",
        synonyms: &["abdomen", "per abdomen", "p/a"],
        text: true,
        get: |r| r.systemic.abdominal.clone(),
        set: Some(|r, v| {
            r.systemic.abdominal = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Colour Vision",
        synonyms: &["color vision"],
        text: true,
        get: |r| r.vision.color_vision.clone(),
        set: Some(|r, v| {
            r.vision.color_vision = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Right Distance",
        synonyms: &["right eye distance", "distance vision right", "re distance"],
        text: true,
        get: |r| r.vision.right_distance.clone(),
        set: Some(|r, v| {
            r.vision.right_distance = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Left Distance",
        synonyms: &["left eye distance", "distance vision left", "le distance"],
        text: true,
        get: |r| r.vision.left_distance.clone(),
        set: Some(|r, v| {
            r.vision.left_distance = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Right Near",
        synonyms: &["right eye near", "near vision right", "re near"],
        text: true,
        get: |r| r.vision.right_near.clone(),
        set: Some(|r, v| {
            r.vision.right_near = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Left Near",
        synonyms: &["left eye near", "near vision left", "le near"],
        text: true,
        get: |r| r.vision.left_near.clone(),
        set: Some(|r, v| {
            r.vision.left_near = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Glasses",
        synonyms: &["spectacles", "wears glasses"],
        text: false,
        get: |r| yes_no(r.vision.glasses).to_string(),
        set: Some(|r, v| {
            r.vision.glasses = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Tobacco",
        synonyms: &["tobacco chewing"],
        text: false,
        get: |r| yes_no(r.addictions.tobacco).to_string(),
        set: Some(|r, v| {
            r.addictions.tobacco = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Smoking",
        synonyms: &["smoker"],
        text: false,
        get: |r| yes_no(r.addictions.smoking).to_string(),
        set: Some(|r, v| {
            r.addictions.smoking = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Drinking",
        synonyms: &["alcohol"],
        text: false,
        get: |r| yes_no(r.addictions.drinking).to_string(),
        set: Some(|r, v| {
            r.addictions.drinking = flag(v)?;
            Ok(())
        }),
    },
    TabColumn {
        header: "Allergies",
        synonyms: &["allergy", "known allergies"],
        text: true,
        get: |r| r.allergies.clone(),
        set: Some(|r, v| {
            r.allergies = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "ECG",
        synonyms: &["ecg report"],
        text: true,
        get: |r| r.ecg.clone(),
        set: Some(|r, v| {
            r.ecg = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "X-Ray",
        synonyms: &["xray", "x ray", "chest x-ray"],
        text: true,
        get: |r| r.xray.clone(),
        set: Some(|r, v| {
            r.xray = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "PFT",
        synonyms: &["pulmonary function", "pulmonary function test"],
        text: true,
        get: |r| r.pft.clone(),
        set: Some(|r, v| {
            r.pft = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Audiometry",
        synonyms: &["audiometry findings", "audiometry remarks"],
        text: true,
        get: |r| r.audiometry.clone(),
        set: Some(|r, v| {
            r.audiometry = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Remarks",
        synonyms: &["remark", "comments"],
        text: true,
        get: |r| r.remarks.clone(),
        set: Some(|r, v| {
            r.remarks = v.to_string();
            Ok(())
        }),
    },
    TabColumn {
        header: "Advice",
        synonyms: &["recommendation", "recommendations"],
        text: true,
        get: |r| r.advice.clone(),
        set: Some(|r, v| {
            r.advice = v.to_string();
            Ok(())
        }),
    },
];

/// Entries that are kept apart by `"; "`. The single blank placeholder
/// exports as an empty cell.
fn join_history(entries: &[String]) -> String {
    entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Right,
    Left,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::Right => "Right",
            Side::Left => "Left",
        }
    }
}

/// Recognise hearing-level headers such as `Right 500`, `left_4000`,
/// `R 1K`, `LE 8000 Hz`.
pub fn hearing_column(header: &str) -> Option<(Side, u32)> {
    let header = header.trim().to_ascii_lowercase();
    let split = header.find(|c: char| c.is_ascii_digit())?;
    let (side, rest) = header.split_at(split);
    let side = match side.trim().trim_end_matches(['_', '-', ' ']).trim() {
        "right" | "r" | "re" | "right ear" => Side::Right,
        "left" | "l" | "le" | "left ear" => Side::Left,
        _ => return None,
    };
    let rest = rest.trim().trim_end_matches("hz").trim();
    let (digits, scale) = match rest.strip_suffix('k') {
        Some(d) => (d, 1000),
        None => (rest, 1),
    };
    let frequency = digits.trim().parse::<u32>().ok()?.checked_mul(scale)?;
    crate::model::STANDARD_FREQUENCIES
        .contains(&frequency)
        .then_some((side, frequency))
}
