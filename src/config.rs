//! Application configuration.
//!
//! Resolved once at startup (from a TOML file or defaults) and then passed
//! explicitly into the export actions and composers. Layout code only ever
//! reads it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::style::Palette;

const CONFIG_DIR_NAME: &str = "medreport";
const CONFIG_FILE_NAME: &str = "config.toml";

/// The persisted settings object injected into every report header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalSettings {
    pub hospital_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub company_name: String,
    /// PNG or JPEG drawn at the top-left of report letterheads.
    pub logo_path: Option<PathBuf>,
}

impl Default for HospitalSettings {
    fn default() -> Self {
        Self {
            hospital_name: "Occupational Health Centre".to_string(),
            address_line1: String::new(),
            address_line2: String::new(),
            company_name: String::new(),
            logo_path: None,
        }
    }
}

/// Page geometry, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub margin_mm: f64,
    /// Audiometry slack below the bottom margin before a page break.
    pub lenient_slack_mm: f64,
    pub chart_height_mm: f64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            margin_mm: 15.0,
            lenient_slack_mm: 3.0,
            chart_height_mm: 55.0,
        }
    }
}

/// A login accepted by [`crate::export::Session::login`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

/// Letterhead defaults for the prescription pad.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrescriptionDefaults {
    pub doctor_name: String,
    pub qualification: String,
    pub registration_number: String,
    pub phone: String,
    pub timings: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: HospitalSettings,
    pub palette: Palette,
    pub page: PageSettings,
    pub credentials: Vec<Credential>,
    pub prescription: PrescriptionDefaults,
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ReportError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ReportError> {
        toml::to_string_pretty(self).map_err(|e| ReportError::Config(e.to_string()))
    }

    /// `$XDG_CONFIG_HOME/medreport/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    fn validate(&self) -> Result<(), ReportError> {
        let page = &self.page;
        if !(page.margin_mm > 0.0 && page.margin_mm < 60.0) {
            return Err(ReportError::Config(format!(
                "page.margin_mm must be between 0 and 60, got {}",
                page.margin_mm
            )));
        }
        if !(0.0..=20.0).contains(&page.lenient_slack_mm) {
            return Err(ReportError::Config(format!(
                "page.lenient_slack_mm must be between 0 and 20, got {}",
                page.lenient_slack_mm
            )));
        }
        if !(page.chart_height_mm > 10.0 && page.chart_height_mm <= 120.0) {
            return Err(ReportError::Config(format!(
                "page.chart_height_mm must be between 10 and 120, got {}",
                page.chart_height_mm
            )));
        }
        if let Some(c) = self.credentials.iter().find(|c| c.username.trim().is_empty()) {
            return Err(ReportError::Config(format!(
                "credential with empty username (password length {})",
                c.password.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page.margin_mm, 15.0);
    }

    #[test]
    fn reads_settings_palette_and_credentials() {
        let config = AppConfig::from_toml_str(
            r#"
            [settings]
            hospital_name = "Sunrise Hospital"
            address_line1 = "12 Ring Road"
            company_name = "Acme Steel Ltd"

            [palette]
            primary = [200, 30, 30]
            secondary = [20, 20, 20]

            [[credentials]]
            username = "clinic"
            password = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.settings.hospital_name, "Sunrise Hospital");
        assert_eq!(config.settings.address_line2, "");
        assert_eq!(config.palette.primary, [200, 30, 30]);
        assert_eq!(config.credentials[0].username, "clinic");
    }

    #[test]
    fn out_of_range_palette_is_rejected() {
        let err = AppConfig::from_toml_str("[palette]\nprimary = [300, 0, 0]\nsecondary = [0, 0, 0]\n")
            .unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn invalid_margin_is_rejected() {
        let err = AppConfig::from_toml_str("[page]\nmargin_mm = 0\n").unwrap_err();
        assert!(err.to_string().contains("margin_mm"));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = AppConfig::default();
        config.settings.company_name = "Acme".to_string();
        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
