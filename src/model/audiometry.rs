//! Pure-tone audiometry readings and the derived ear status.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The six standard test frequencies, in Hz, in plotting order.
pub const STANDARD_FREQUENCIES: [u32; 6] = [500, 1000, 2000, 4000, 6000, 8000];

/// Readings at or above this level (dB) flag the ear as abnormal.
pub const ABNORMAL_THRESHOLD_DB: i32 = 50;

/// Hearing level in dB per frequency for one ear.
///
/// Missing frequencies read as 0 dB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EarReadings(BTreeMap<u32, i32>);

impl EarReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from levels given in [`STANDARD_FREQUENCIES`] order.
    pub fn from_levels(levels: [i32; 6]) -> Self {
        Self(STANDARD_FREQUENCIES.iter().copied().zip(levels).collect())
    }

    pub fn set(&mut self, frequency: u32, level: i32) {
        self.0.insert(frequency, level);
    }

    pub fn get(&self, frequency: u32) -> Option<i32> {
        self.0.get(&frequency).copied()
    }

    /// Level at `frequency`, 0 when not recorded.
    pub fn level(&self, frequency: u32) -> i32 {
        self.get(frequency).unwrap_or(0)
    }

    /// Levels for the six standard frequencies, in order.
    pub fn standard_levels(&self) -> [i32; 6] {
        STANDARD_FREQUENCIES.map(|f| self.level(f))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn status(&self) -> EarStatus {
        if self
            .standard_levels()
            .iter()
            .any(|&db| db >= ABNORMAL_THRESHOLD_DB)
        {
            EarStatus::Abnormal
        } else {
            EarStatus::Normal
        }
    }
}

/// Per-ear audiogram data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hearing {
    #[serde(default)]
    pub right: EarReadings,
    #[serde(default)]
    pub left: EarReadings,
}

impl Hearing {
    /// True when neither ear has any reading, so charts are skipped.
    pub fn is_empty(&self) -> bool {
        self.right.is_empty() && self.left.is_empty()
    }
}

/// Derived classification of one ear. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarStatus {
    Normal,
    Abnormal,
}

impl EarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EarStatus::Normal => "Normal",
            EarStatus::Abnormal => "Abnormal",
        }
    }
}

impl fmt::Display for EarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column label for a frequency, e.g. `"1K Hz"` or `"500 Hz"`.
pub fn frequency_label(frequency: u32) -> String {
    if frequency >= 1000 && frequency % 1000 == 0 {
        format!("{}K Hz", frequency / 1000)
    } else {
        format!("{} Hz", frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_below_threshold_is_normal() {
        let ear = EarReadings::from_levels([15, 10, 15, 20, 15, 20]);
        assert_eq!(ear.status(), EarStatus::Normal);
    }

    #[test]
    fn one_reading_at_55_is_abnormal() {
        let ear = EarReadings::from_levels([15, 10, 15, 55, 15, 20]);
        assert_eq!(ear.status(), EarStatus::Abnormal);
    }

    #[test]
    fn threshold_is_inclusive() {
        let ear = EarReadings::from_levels([0, 0, 0, 0, 0, 50]);
        assert_eq!(ear.status(), EarStatus::Abnormal);
        let ear = EarReadings::from_levels([49, 49, 49, 49, 49, 49]);
        assert_eq!(ear.status(), EarStatus::Normal);
    }

    #[test]
    fn missing_frequencies_read_as_zero() {
        let mut ear = EarReadings::new();
        ear.set(4000, 30);
        assert_eq!(ear.standard_levels(), [0, 0, 0, 30, 0, 0]);
        assert_eq!(ear.status(), EarStatus::Normal);
    }

    #[test]
    fn readings_serialize_as_frequency_map() {
        let ear = EarReadings::from_levels([15, 10, 15, 20, 15, 20]);
        let json = serde_json::to_value(&ear).unwrap();
        assert_eq!(json["4000"], 20);
        let back: EarReadings = serde_json::from_value(json).unwrap();
        assert_eq!(back, ear);
    }

    #[test]
    fn labels() {
        assert_eq!(frequency_label(500), "500 Hz");
        assert_eq!(frequency_label(8000), "8K Hz");
    }
}
