//! # Rubrica
//!
//! Page-native PDF reports for rubric-based continuous assessment.
//!
//! A report has two sections. The reference table prints every rubric item
//! with its four level descriptors. The scorecard grid prints one card per
//! student evaluation, with the recorded level circled.
//!
//! Layout never renders onto an endless canvas to be cut into pages later.
//! Every table row and every row of cards is measured first, and the page
//! boundary decides where it goes: rows are never split, and a row that
//! cannot fit even an empty page is an error rather than a clipped PDF.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    — Rubric items and evaluations, normalized once
//!       ↓
//!   [text]     — Word wrap with exact standard-font metrics
//!       ↓
//!   [layout]   — Reference table, scorecard grid, page chrome
//!       ↓
//!   [pdf]      — Serialize to PDF bytes
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod report;
pub mod style;
pub mod text;

pub use config::ReportConfig;
pub use error::ReportError;
pub use model::{DateFilter, Evaluation, ReportInput, RubricItem};
pub use report::{RenderedReport, Report};

/// Render a report with the default configuration.
///
/// This is the primary entry point.
pub fn render(input: &ReportInput, filter: &DateFilter) -> Result<RenderedReport, ReportError> {
    Report::new(ReportConfig::default())?.render(input, filter)
}

/// Render a report described as JSON with the default configuration.
pub fn render_json(json: &str, filter: &DateFilter) -> Result<RenderedReport, ReportError> {
    Report::new(ReportConfig::default())?.render_json(json, filter)
}
