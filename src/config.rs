//! # Report Configuration
//!
//! Page geometry, typography and labels for a report. Every field has a
//! default, so an empty JSON object is a valid configuration. Lengths are in
//! millimetres, font sizes in points.

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::style::{Color, Edges};

/// Standard page sizes, portrait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in millimetres.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub page_size: PageSize,
    pub margin: Edges,

    /// Running title drawn at the top of every page.
    pub title: String,
    /// Height of the running header band, title included.
    pub header_height: f64,
    /// Footer text; `{page}` and `{pages}` are substituted.
    pub footer_label: String,
    /// Distance from the bottom page edge to the footer baseline.
    pub footer_offset: f64,
    /// Optional "generated on" text shown at the left of the footer.
    pub generated_on: Option<String>,

    // ── Reference table ──
    pub column_labels: [String; 6],
    pub table_width: f64,
    pub column_widths: [f64; 6],
    pub header_row_height: f64,
    pub repeat_header: bool,
    pub line_height: f64,
    /// Horizontal inner margin on each side of a cell.
    pub cell_margin: f64,
    /// Vertical padding used to derive the default minimum row height.
    pub cell_padding: f64,
    /// Defaults to one line plus padding above and below.
    pub min_row_height: Option<f64>,
    pub section_spacing: f64,

    // ── Scorecard grid ──
    /// Heading above the cards; empty to omit.
    pub section_title: String,
    pub section_title_height: f64,
    pub grid_columns: usize,
    pub card_gap: f64,
    pub card_header_height: f64,
    pub card_row_height: f64,
    pub card_identifier_width: f64,
    /// Vertical space reserved below each card's closing rule.
    pub card_spacing: f64,
    pub mark_diameter: f64,

    // ── Typography ──
    pub font_family: String,
    pub title_font_size: f64,
    pub header_font_size: f64,
    pub body_font_size: f64,
    pub card_font_size: f64,
    pub footer_font_size: f64,

    // ── Strokes and fills ──
    pub border_width: f64,
    pub rule_width: f64,
    pub header_fill: Color,
    pub card_header_fill: Color,
    pub mark_fill: Color,

    // ── Output ──
    pub file_stem: String,
    /// File name suffix used when every date is included.
    pub all_dates_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: Edges {
                top: 10.0,
                right: 10.0,
                bottom: 15.0,
                left: 10.0,
            },
            title: "INFORME DE EVALUACIÓN CONTINUA".to_string(),
            header_height: 15.0,
            footer_label: "Página {page} de {pages}".to_string(),
            footer_offset: 8.0,
            generated_on: None,
            column_labels: [
                "It.".to_string(),
                "Descripción".to_string(),
                "Nivel 1".to_string(),
                "Nivel 2".to_string(),
                "Nivel 3".to_string(),
                "Nivel 4".to_string(),
            ],
            table_width: 190.0,
            column_widths: [10.0, 50.0, 32.5, 32.5, 32.5, 32.5],
            header_row_height: 7.0,
            repeat_header: true,
            line_height: 4.0,
            cell_margin: 1.0,
            cell_padding: 1.0,
            min_row_height: None,
            section_spacing: 8.0,
            section_title: "RESULTADOS INDIVIDUALES".to_string(),
            section_title_height: 10.0,
            grid_columns: 3,
            card_gap: 4.0,
            card_header_height: 7.0,
            card_row_height: 6.0,
            card_identifier_width: 10.0,
            card_spacing: 4.0,
            mark_diameter: 4.6,
            font_family: "Helvetica".to_string(),
            title_font_size: 15.0,
            header_font_size: 9.0,
            body_font_size: 8.0,
            card_font_size: 9.0,
            footer_font_size: 7.0,
            border_width: 0.2,
            rule_width: 0.4,
            header_fill: Color::gray(230),
            card_header_fill: Color::gray(220),
            mark_fill: Color::gray(200),
            file_stem: "evaluaciones".to_string(),
            all_dates_label: "todas".to_string(),
        }
    }
}

impl ReportConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let config: ReportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn min_row_height(&self) -> f64 {
        self.min_row_height
            .unwrap_or(self.line_height + 2.0 * self.cell_padding)
    }

    /// Printable width between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.page_size.dimensions().0 - self.margin.horizontal()
    }

    /// Width of one scorecard column.
    pub fn card_width(&self) -> f64 {
        let columns = self.grid_columns.max(1) as f64;
        (self.content_width() - (columns - 1.0) * self.card_gap) / columns
    }

    /// Reject configurations that cannot produce a sound layout.
    pub fn validate(&self) -> Result<(), ReportError> {
        let (page_w, page_h) = self.page_size.dimensions();
        let positive = [
            ("page width", page_w),
            ("page height", page_h),
            ("table width", self.table_width),
            ("line height", self.line_height),
            ("header row height", self.header_row_height),
            ("card header height", self.card_header_height),
            ("card row height", self.card_row_height),
            ("card identifier width", self.card_identifier_width),
            ("title font size", self.title_font_size),
            ("header font size", self.header_font_size),
            ("body font size", self.body_font_size),
            ("card font size", self.card_font_size),
            ("footer font size", self.footer_font_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ReportError::Config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let non_negative = [
            ("margin", self.margin.min()),
            ("header height", self.header_height),
            ("cell margin", self.cell_margin),
            ("cell padding", self.cell_padding),
            ("section spacing", self.section_spacing),
            ("section title height", self.section_title_height),
            ("card gap", self.card_gap),
            ("card spacing", self.card_spacing),
            ("mark diameter", self.mark_diameter),
            ("border width", self.border_width),
            ("rule width", self.rule_width),
            ("footer offset", self.footer_offset),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ReportError::Config(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        if let Some(min) = self.min_row_height {
            if !(min.is_finite() && min > 0.0) {
                return Err(ReportError::Config(format!(
                    "min row height must be positive, got {min}"
                )));
            }
        }

        if self.column_widths.iter().any(|w| !(w.is_finite() && *w > 0.0)) {
            return Err(ReportError::Config(
                "every column width must be positive".to_string(),
            ));
        }
        let sum: f64 = self.column_widths.iter().sum();
        if (sum - self.table_width).abs() > 0.01 {
            return Err(ReportError::Config(format!(
                "column widths add up to {sum} but the table is {} wide",
                self.table_width
            )));
        }
        if self.table_width > self.content_width() + 0.01 {
            return Err(ReportError::Config(format!(
                "table width {} exceeds the printable width {}",
                self.table_width,
                self.content_width()
            )));
        }

        let printable = page_h - self.margin.vertical() - self.header_height;
        if printable <= 0.0 {
            return Err(ReportError::Config(
                "margins and header leave no printable height".to_string(),
            ));
        }

        if self.grid_columns == 0 {
            return Err(ReportError::Config(
                "grid columns must be at least 1".to_string(),
            ));
        }
        let card_width = self.card_width();
        if card_width <= self.card_identifier_width {
            return Err(ReportError::Config(format!(
                "cards are {card_width:.1}mm wide, too narrow for a {}mm identifier cell",
                self.card_identifier_width
            )));
        }
        if self.mark_diameter > self.card_row_height {
            return Err(ReportError::Config(format!(
                "mark diameter {} does not fit a {}mm card row",
                self.mark_diameter, self.card_row_height
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReportConfig::default();
        config.validate().unwrap();
        assert_eq!(config.table_width, 190.0);
        assert_eq!(config.min_row_height(), 6.0);
        assert!((config.content_width() - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_json_is_the_default() {
        let config = ReportConfig::from_json("{}").unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_partial_json_overrides_fields() {
        let json = r#"{ "gridColumns": 2, "minRowHeight": 9, "fileStem": "informe" }"#;
        let config = ReportConfig::from_json(json).unwrap();
        assert_eq!(config.grid_columns, 2);
        assert_eq!(config.min_row_height(), 9.0);
        assert_eq!(config.file_stem, "informe");
        assert_eq!(config.line_height, 4.0);
    }

    #[test]
    fn test_column_widths_must_match_table_width() {
        let config = ReportConfig {
            column_widths: [10.0, 50.0, 30.0, 30.0, 30.0, 30.0],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("add up to 180"), "got {err}");
    }

    #[test]
    fn test_zero_columns_rejected() {
        let config = ReportConfig {
            grid_columns: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_negative_line_height_rejected() {
        let config = ReportConfig {
            line_height: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_mark_rejected() {
        let config = ReportConfig {
            mark_diameter: 8.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_card_width_splits_printable_width() {
        let config = ReportConfig::default();
        let expected = (190.0 - 2.0 * 4.0) / 3.0;
        assert!((config.card_width() - expected).abs() < 1e-9);
    }
}
