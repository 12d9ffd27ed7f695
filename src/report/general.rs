//! General medical examination report.

use super::fields::{draw_fields, opt_u32, trim_number, with_unit, FieldSpec};
use super::{draw_letterhead, format_date, Composer, ReportContext, ReportKind};
use crate::error::ReportError;
use crate::layout::primitives::{self, Align, Cell};
use crate::layout::{BreakPolicy, PageWriter};
use crate::model::{yes_no, ConditionFlags, PatientRecord};
use crate::style::TextStyle;

const PATIENT_INFORMATION: &[FieldSpec] = &[
    FieldSpec::left("Name", |r| r.name.clone()),
    FieldSpec::right("Age", |r| opt_u32(r.age)),
    FieldSpec::left("Sex", |r| r.gender.clone()),
    FieldSpec::right("Employee Code", |r| r.employee_code.clone()),
    FieldSpec::left("Certificate No", |r| r.certificate_number.clone()),
    FieldSpec::right("Department", |r| r.department.clone()),
    FieldSpec::left("Contractor", |r| r.contractor.clone()),
    FieldSpec::right("Contact Number", |r| r.contact_number.clone()).no_wrap(),
    FieldSpec::left("Test Date", |r| format_date(r.test_date)),
];

const PHYSIOLOGICAL_DATA: &[FieldSpec] = &[
    FieldSpec::left("Height", |r| with_unit(r.height_cm, "cm")),
    FieldSpec::right("Weight", |r| with_unit(r.weight_kg, "kg")),
    FieldSpec::left("BMI", |r| r.bmi.map(trim_number).unwrap_or_default()),
    FieldSpec::right("Expected Weight", |r| with_unit(r.expected_weight, "kg")),
    FieldSpec::left("Chest", |r| r.chest.clone()),
    FieldSpec::right("Blood Pressure", |r| {
        let bp = r.blood_pressure();
        if bp.is_empty() {
            bp
        } else {
            format!("{} mmHg", bp)
        }
    }),
    FieldSpec::left("Pulse", |r| {
        r.pulse.map(|p| format!("{} /min", p)).unwrap_or_default()
    }),
];

const MEDICAL_HISTORY: &[FieldSpec] = &[
    FieldSpec::full("Past History", |r| history(&r.past_conditions, &r.past_history)),
    FieldSpec::full("Present History", |r| {
        history(&r.present_conditions, &r.present_history)
    }),
    FieldSpec::full("Allergies", |r| r.allergies.clone()),
];

const FAMILY_HISTORY: &[FieldSpec] = &[
    FieldSpec::left("Father", |r| r.family_history.father.summary()),
    FieldSpec::right("Mother", |r| r.family_history.mother.summary()),
];

const SYSTEMIC_EXAMINATION: &[FieldSpec] = &[
    FieldSpec::left("Respiratory", |r| r.systemic.respiratory.clone()),
    FieldSpec::right("Cardiovascular", |r| r.systemic.cardiovascular.clone()),
    FieldSpec::left("Nervous System", |r| r.systemic.nervous.clone()),
    FieldSpec::right("Abdominal", |r| r.systemic.abdominal.clone()),
];

const VISION_EXAMINATION: &[FieldSpec] = &[
    FieldSpec::left("Colour Vision", |r| r.vision.color_vision.clone()),
    FieldSpec::right("Glasses", |r| yes_no(r.vision.glasses).to_string()),
    FieldSpec::left("Right Distance", |r| r.vision.right_distance.clone()),
    FieldSpec::right("Left Distance", |r| r.vision.left_distance.clone()),
    FieldSpec::left("Right Near", |r| r.vision.right_near.clone()),
    FieldSpec::right("Left Near", |r| r.vision.left_near.clone()),
];

const ADDICTIONS: &[FieldSpec] = &[
    FieldSpec::left("Tobacco", |r| yes_no(r.addictions.tobacco).to_string()),
    FieldSpec::right("Smoking", |r| yes_no(r.addictions.smoking).to_string()),
    FieldSpec::left("Drinking", |r| yes_no(r.addictions.drinking).to_string()),
];

const AUDIOMETRY_SUMMARY: &[FieldSpec] = &[FieldSpec::full("Audiometry", audiometry_summary)];

/// Flagged conditions first, then the free-text entries.
fn history(flags: &ConditionFlags, entries: &[String]) -> String {
    flags
        .names()
        .into_iter()
        .map(str::to_string)
        .chain(
            entries
                .iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        )
        .collect::<Vec<_>>()
        .join(", ")
}

fn audiometry_summary(r: &PatientRecord) -> String {
    if !r.audiometry.trim().is_empty() || r.hearing.is_empty() {
        return r.audiometry.clone();
    }
    format!(
        "Right Ear: {}, Left Ear: {}",
        r.right_ear_status(),
        r.left_ear_status()
    )
}

pub struct GeneralReport;

impl Composer for GeneralReport {
    fn kind(&self) -> ReportKind {
        ReportKind::General
    }

    fn policy(&self, _ctx: &ReportContext) -> BreakPolicy {
        BreakPolicy::Strict
    }

    fn compose(
        &self,
        record: &PatientRecord,
        w: &mut PageWriter,
        ctx: &ReportContext,
    ) -> Result<(), ReportError> {
        let m = ctx.metrics();
        w.set_policy(self.policy(ctx));
        draw_letterhead(w, &m, ctx);
        let title = TextStyle::bold(13.0).with_color(m.ink);
        primitives::aligned_line(w, &self.kind().title().to_uppercase(), title, 18.0, Align::Center);

        primitives::section_header(w, &m, "Patient Information");
        draw_fields(w, &m, PATIENT_INFORMATION, record);

        primitives::section_header(w, &m, "Physiological Data");
        draw_fields(w, &m, PHYSIOLOGICAL_DATA, record);

        primitives::section_header(w, &m, "Medical History");
        draw_fields(w, &m, MEDICAL_HISTORY, record);
        primitives::sub_header(w, &m, "Family History");
        draw_fields(w, &m, FAMILY_HISTORY, record);
        primitives::sub_header(w, &m, "Systemic Examination");
        draw_fields(w, &m, SYSTEMIC_EXAMINATION, record);

        primitives::section_header(w, &m, "Vision Examination");
        draw_fields(w, &m, VISION_EXAMINATION, record);

        primitives::section_header(w, &m, "Addictions");
        draw_fields(w, &m, ADDICTIONS, record);

        primitives::section_header(w, &m, "Specialized Tests");
        primitives::columns(
            w,
            &m,
            &[
                Cell::new("ECG", record.ecg.as_str()),
                Cell::new("X-Ray", record.xray.as_str()),
                Cell::new("PFT", record.pft.as_str()),
            ],
            3,
        );
        draw_fields(w, &m, AUDIOMETRY_SUMMARY, record);

        primitives::section_header(w, &m, "Remarks");
        primitives::paragraph(w, &m, None, &record.remarks);

        primitives::section_header(w, &m, "Advice");
        primitives::paragraph(w, &m, None, &record.advice);

        Ok(())
    }
}
