//! Structured error types for report rendering.
//!
//! A render either returns complete PDF bytes or one of these. There is no
//! partial-document recovery.

use thiserror::Error;

/// The unified error type returned by all public rubrica API functions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON input failed to parse as report input or configuration.
    #[error("Failed to parse input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A record is unusable (empty identifier, incomplete evaluation).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The configuration is internally inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Layout arithmetic produced degenerate geometry.
    #[error("Layout error: {0}")]
    Layout(String),
    /// A single row or card cannot fit on an empty page.
    #[error("{what} is {height:.1}mm tall but a page has {available:.1}mm of printable height")]
    Oversized {
        what: String,
        height: f64,
        available: f64,
    },
    /// Reading input or writing the PDF failed (CLI only).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
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
                "The JSON is valid but doesn't match the expected schema. \
                 Check field names and types."
                    .to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ReportError::Parse { source: e, hint }
    }
}
