//! Structured error types for report generation.
//!
//! Every public operation returns [`ReportError`]. Failures are caught at
//! the action boundary (see [`crate::export::Notice`]) and turned into a
//! user-facing message; nothing is retried.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type returned by all public medreport functions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Required identifying fields are missing. Rendering never starts.
    #[error("Missing required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    /// Layout or PDF generation failed part-way.
    #[error("Render error: {0}")]
    Render(String),

    /// A value had the wrong shape for the field it was drawn into.
    #[error("Type mismatch in field '{field}': {detail}")]
    TypeMismatch { field: String, detail: String },

    /// Audiogram rasterization or encoding failed.
    #[error("Chart generation failed: {0}")]
    Chart(String),

    /// An embedded image could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// A spreadsheet could not be read, or held no records.
    #[error("Failed to import '{}': {reason}", .file.display())]
    Import { file: PathBuf, reason: String },

    /// A spreadsheet could not be written.
    #[error("Failed to write '{}': {reason}", .file.display())]
    Export { file: PathBuf, reason: String },

    /// Export attempted without a logged-in session.
    #[error("Not authenticated; redirect to {redirect}")]
    Unauthenticated { redirect: String },

    /// No record with the given id.
    #[error("Record not found: {0}")]
    NotFound(uuid::Uuid),

    /// Configuration file is malformed or holds invalid values.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON input failed to parse as records or a prescription pad.
    #[error("Failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the record schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ReportError::Parse { source: e, hint }
    }
}

impl From<toml::de::Error> for ReportError {
    fn from(e: toml::de::Error) -> Self {
        ReportError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_lists_every_missing_field() {
        let err = ReportError::Validation {
            missing: vec!["Name".to_string(), "Certificate Number".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required fields: Name, Certificate Number"
        );
    }

    #[test]
    fn parse_error_carries_hint() {
        let e = serde_json::from_str::<serde_json::Value>("[1, 2,").unwrap_err();
        let err = ReportError::from(e);
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse input"));
        assert!(msg.contains("Hint: Unexpected end of input"));
    }
}
