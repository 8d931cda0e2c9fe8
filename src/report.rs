//! # Report Assembly
//!
//! Ties the pipeline together for one render: normalize the input, lay out
//! the reference table and the scorecards, number the pages, write the PDF.

use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::font::FontContext;
use crate::layout::{LayoutEngine, LayoutPage};
use crate::model::{DateFilter, Evaluation, ReportInput};
use crate::pdf::{DocumentInfo, PdfWriter};

/// A finished report.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    /// Suggested download name, e.g. `evaluaciones_2024-03-05.pdf`.
    pub file_name: String,
    pub page_count: usize,
}

/// A validated report configuration. Holds no per-render state and can be
/// reused for any number of renders.
#[derive(Debug, Clone)]
pub struct Report {
    config: ReportConfig,
}

impl Report {
    pub fn new(config: ReportConfig) -> Result<Self, ReportError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Lay out `input` without writing a PDF.
    pub fn layout(
        &self,
        input: &ReportInput,
        filter: &DateFilter,
    ) -> Result<Vec<LayoutPage>, ReportError> {
        let font_context = FontContext::new();
        self.layout_with(input, filter, &font_context)
            .map(|(pages, _)| pages)
    }

    fn layout_with(
        &self,
        input: &ReportInput,
        filter: &DateFilter,
        font_context: &FontContext,
    ) -> Result<(Vec<LayoutPage>, String), ReportError> {
        let snapshot = input.normalize();
        let evaluations: Vec<&Evaluation> = snapshot.filtered(filter).collect();
        debug!(
            items = snapshot.rubric.len(),
            evaluations = snapshot.evaluations.len(),
            selected = evaluations.len(),
            ?filter,
            "input normalized"
        );

        let title = snapshot
            .title
            .clone()
            .unwrap_or_else(|| self.config.title.clone());
        let engine = LayoutEngine::new(&self.config, font_context);
        let pages = engine.layout(&title, &snapshot.rubric, &evaluations)?;
        Ok((pages, title))
    }

    /// Render `input` to PDF bytes.
    pub fn render(
        &self,
        input: &ReportInput,
        filter: &DateFilter,
    ) -> Result<RenderedReport, ReportError> {
        let font_context = FontContext::new();
        let (pages, title) = self.layout_with(input, filter, &font_context)?;

        let info = DocumentInfo {
            title: Some(title),
            subject: match filter {
                DateFilter::All => None,
                DateFilter::On(date) => Some(date.clone()),
            },
        };
        let bytes = PdfWriter::new().write(&pages, &info, &font_context);
        let report = RenderedReport {
            file_name: self.file_name(filter),
            page_count: pages.len(),
            bytes,
        };

        info!(
            file = %report.file_name,
            pages = report.page_count,
            bytes = report.bytes.len(),
            "report rendered"
        );
        Ok(report)
    }

    /// Parse JSON input and render it.
    pub fn render_json(
        &self,
        json: &str,
        filter: &DateFilter,
    ) -> Result<RenderedReport, ReportError> {
        let input = ReportInput::from_json(json)?;
        self.render(&input, filter)
    }

    /// `{file_stem}_{date}.pdf`, or `{file_stem}_{all_dates_label}.pdf`.
    pub fn file_name(&self, filter: &DateFilter) -> String {
        let suffix = match filter {
            DateFilter::All => self.config.all_dates_label.as_str(),
            DateFilter::On(date) => date.as_str(),
        };
        format!("{}_{}.pdf", self.config.file_stem, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Evaluation, RubricItem};

    const LEVELS: [&str; 4] = ["Inicial", "En proceso", "Adquirido", "Avanzado"];

    fn input() -> ReportInput {
        ReportInput {
            title: None,
            items: vec![
                RubricItem::new("A", "Comprensión lectora", LEVELS),
                RubricItem::new("B", "Expresión escrita", LEVELS),
            ],
            evaluations: vec![
                Evaluation::new("Ana (1ºA)", "2024-03-05", &[("A", 3), ("B", 2)]),
                Evaluation::new("Luis (1ºA)", "2024-03-06", &[("A", 1), ("B", 4)]),
            ],
        }
    }

    fn report() -> Report {
        Report::new(ReportConfig::default()).unwrap()
    }

    #[test]
    fn test_file_names() {
        let report = report();
        assert_eq!(report.file_name(&DateFilter::All), "evaluaciones_todas.pdf");
        assert_eq!(
            report.file_name(&DateFilter::On("2024-03-05".into())),
            "evaluaciones_2024-03-05.pdf"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ReportConfig {
            grid_columns: 0,
            ..Default::default()
        };
        assert!(matches!(Report::new(config), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_date_filter_limits_cards() {
        let pages = report()
            .layout(&input(), &DateFilter::On("2024-03-05".into()))
            .unwrap();
        let cards: usize = pages.iter().map(|p| p.find_all("Card").len()).sum();
        assert_eq!(cards, 1);
    }

    #[test]
    fn test_input_title_overrides_config() {
        let mut input = input();
        input.title = Some("Lengua 1ºA".to_string());
        let pages = report().layout(&input, &DateFilter::All).unwrap();
        let header = pages[0].find_all("PageHeader")[0].children[0].text_content();
        assert_eq!(header.as_deref(), Some("Lengua 1ºA"));
    }

    #[test]
    fn test_render_reports_pages_and_name() {
        let rendered = report().render(&input(), &DateFilter::All).unwrap();
        assert_eq!(rendered.page_count, 1);
        assert_eq!(rendered.file_name, "evaluaciones_todas.pdf");
        assert!(rendered.bytes.starts_with(b"%PDF-1.7"));
    }

    #[test]
    fn test_render_json_reports_parse_errors() {
        let err = report().render_json("{ not json", &DateFilter::All).unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }
}
