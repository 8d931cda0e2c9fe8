//! Integration tests for the rubrica rendering pipeline.
//!
//! These tests exercise the full path from JSON input to PDF output.
//! They verify:
//! - Storage-shaped JSON deserializes and normalizes correctly
//! - Reference table rows and scorecards get the right geometry
//! - Page breaks never split a row or a card
//! - PDF output is structurally valid and deterministic

use rubrica::config::ReportConfig;
use rubrica::font::FontContext;
use rubrica::layout::{DrawCommand, LayoutElement, LayoutPage};
use rubrica::model::*;
use rubrica::style::FontSpec;
use rubrica::text::TextLayout;
use rubrica::{Report, ReportError};

// ─── Helpers ────────────────────────────────────────────────────

fn item(id: &str, description: &str) -> RubricItem {
    RubricItem::new(
        id,
        description,
        ["Inicial", "En proceso", "Adquirido", "Avanzado"],
    )
}

fn make_input(items: Vec<RubricItem>, evaluations: Vec<Evaluation>) -> ReportInput {
    ReportInput {
        title: None,
        items,
        evaluations,
    }
}

fn report() -> Report {
    Report::new(ReportConfig::default()).unwrap()
}

fn layout(input: &ReportInput, filter: &DateFilter) -> Vec<LayoutPage> {
    report().layout(input, filter).unwrap()
}

fn count(pages: &[LayoutPage], node_type: &str) -> usize {
    pages.iter().map(|p| p.find_all(node_type).len()).sum()
}

fn text_of(element: &LayoutElement) -> String {
    element
        .children
        .iter()
        .filter_map(LayoutElement::text_content)
        .collect::<Vec<_>>()
        .join("")
}

fn bottom_limit() -> f64 {
    let config = ReportConfig::default();
    config.page_size.dimensions().1 - config.margin.bottom
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(
        bytes.windows(4).any(|w| w == b"xref"),
        "Missing xref table"
    );
    assert!(
        bytes.windows(7).any(|w| w == b"trailer"),
        "Missing trailer"
    );
}

fn large_input() -> ReportInput {
    let items = (b'A'..=b'L')
        .map(|c| {
            item(
                &(c as char).to_string(),
                &"Aplica estrategias de comprensión a textos de distinta tipología ".repeat(3),
            )
        })
        .collect();
    let evaluations = (0..40)
        .map(|i| {
            Evaluation::new(
                &format!("Alumno {i:02} (2ºB)"),
                if i % 2 == 0 { "2024-03-05" } else { "2024-03-12" },
                &[("A", 1 + (i % 4) as u8), ("B", 2), ("C", 3), ("D", 4), ("E", 1)],
            )
        })
        .collect();
    make_input(items, evaluations)
}

// ─── Basic Pipeline Tests ───────────────────────────────────────

#[test]
fn test_empty_input_produces_one_page() {
    let rendered = report()
        .render(&make_input(vec![], vec![]), &DateFilter::All)
        .unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.page_count, 1);

    let pages = layout(&make_input(vec![], vec![]), &DateFilter::All);
    assert_eq!(count(&pages, "TableRow"), 0);
    assert_eq!(count(&pages, "Card"), 0);
    assert_eq!(count(&pages, "PageHeader"), 1);
}

#[test]
fn test_storage_shaped_json() {
    let json = r#"{
        "configuracion_items": [
            { "letra": "B", "descripcion": "Escribe", "nivel_1": null, "nivel_2": "None", "nivel_3": "nan", "nivel_4": "Muy bien" },
            { "letra": "A", "descripcion": "Lee", "nivel_1": "1", "nivel_2": "2", "nivel_3": "3", "nivel_4": "4" }
        ],
        "evaluaciones_alumnos": [
            { "nombre_alumno": "Ana", "puntos": "{\"A\": \"3\", \"B\": 9}", "fecha": "2024-03-05T10:00:00+00:00" }
        ]
    }"#;
    let input = ReportInput::from_json(json).unwrap();
    let snapshot = input.normalize();

    let ids: Vec<&str> = snapshot
        .rubric
        .items()
        .iter()
        .map(|i| i.identifier.as_str())
        .collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(snapshot.rubric.get("B").unwrap().level_1, "");
    assert_eq!(snapshot.rubric.get("B").unwrap().level_2, "");
    assert_eq!(snapshot.rubric.get("B").unwrap().level_3, "");

    let eval = &snapshot.evaluations[0];
    assert_eq!(eval.date, "2024-03-05");
    assert_eq!(eval.level_for("A"), Some(3));
    assert_eq!(eval.level_for("B"), None);

    let rendered = report()
        .render(&input, &DateFilter::parse("2024-03-05"))
        .unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.file_name, "evaluaciones_2024-03-05.pdf");
}

#[test]
fn test_render_json_entry_point() {
    let json = r#"{ "items": [{ "letra": "A", "descripcion": "Lee" }], "evaluations": [] }"#;
    let rendered = rubrica::render_json(json, &DateFilter::All).unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.file_name, "evaluaciones_todas.pdf");
}

// ─── Reference Table ────────────────────────────────────────────

#[test]
fn test_long_description_drives_row_height() {
    let description = "Comprende textos orales y escritos, identifica ideas principales, \
        secundarias y la intención comunicativa del emisor, y las relaciona con su \
        experiencia personal y escolar de forma crítica y argumentada.";
    assert!(description.chars().count() >= 200);

    let pages = layout(&make_input(vec![item("A", description)], vec![]), &DateFilter::All);
    let rows = pages[0].find_all("TableRow");
    assert_eq!(rows.len(), 1);

    let config = ReportConfig::default();
    let expected_lines = TextLayout::new().line_count(
        &FontContext::new(),
        description,
        config.column_widths[1],
        config.cell_margin,
        &FontSpec::regular("Helvetica", config.body_font_size),
        config.content_width(),
    );
    assert!(expected_lines > 1);
    let row = rows[0];
    assert!(
        (row.height - expected_lines as f64 * config.line_height).abs() < 1e-9,
        "row height {} for {} lines",
        row.height,
        expected_lines
    );
    assert_eq!(row.children.len(), 6);
    for cell in &row.children {
        assert_eq!(cell.height, row.height, "cell height differs from row height");
    }
}

#[test]
fn test_rows_sorted_and_never_below_minimum() {
    let input = make_input(vec![item("C", "c"), item("A", "a"), item("B", "b")], vec![]);
    let pages = layout(&input, &DateFilter::All);
    let rows = pages[0].find_all("TableRow");
    let ids: Vec<String> = rows.iter().map(|r| text_of(&r.children[0])).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    let min = ReportConfig::default().min_row_height();
    for row in rows {
        assert!(row.height >= min);
    }
}

#[test]
fn test_text_blocks_share_top_inset() {
    let input = make_input(
        vec![RubricItem::new(
            "A",
            &"descripción larga ".repeat(12),
            ["corto", &"nivel con varias palabras ".repeat(3), "x", "y"],
        )],
        vec![],
    );
    let pages = layout(&input, &DateFilter::All);
    let row = pages[0].find_all("TableRow")[0];
    let tops: Vec<f64> = row.children.iter().map(|cell| cell.children[0].y).collect();
    for top in &tops {
        assert!((top - tops[0]).abs() < 1e-9, "text tops differ: {:?}", tops);
    }
}

// ─── Scorecards ─────────────────────────────────────────────────

#[test]
fn test_seven_evaluations_fill_rows_of_three() {
    let evaluations = (0..7)
        .map(|i| Evaluation::new(&format!("Alumno {i}"), "2024-03-05", &[("A", 2)]))
        .collect();
    let pages = layout(&make_input(vec![item("A", "Lee")], evaluations), &DateFilter::All);
    let cards = pages[0].find_all("Card");
    assert_eq!(cards.len(), 7);

    let mut rows: Vec<(f64, usize)> = Vec::new();
    for card in &cards {
        match rows.last_mut() {
            Some((y, n)) if (*y - card.y).abs() < 1e-9 => *n += 1,
            _ => rows.push((card.y, 1)),
        }
    }
    let sizes: Vec<usize> = rows.iter().map(|(_, n)| *n).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
    assert!((rows[1].0 - (rows[0].0 + cards[0].height)).abs() < 1e-9);
}

#[test]
fn test_selected_level_is_circled_and_bold() {
    let input = make_input(
        vec![item("A", "Lee")],
        vec![Evaluation::new("Ana", "2024-03-05", &[("A", 3)])],
    );
    let pages = layout(&input, &DateFilter::All);
    let cells = pages[0].find_all("LevelCell");
    assert_eq!(cells.len(), 4);

    for (i, cell) in cells.iter().enumerate() {
        let level = i + 1;
        let marked = cell.children.iter().any(|c| c.node_type.as_deref() == Some("LevelMark"));
        let bold = cell.children.iter().any(|c| {
            matches!(&c.draw, DrawCommand::Text { font, .. } if font.is_bold())
        });
        assert_eq!(marked, level == 3, "level {level} mark");
        assert_eq!(bold, level == 3, "level {level} weight");
        assert_eq!(text_of(cell), level.to_string());
    }
}

#[test]
fn test_rubric_drift_is_tolerated() {
    let input = make_input(
        vec![item("A", "Lee"), item("B", "Escribe")],
        vec![Evaluation::new("Ana", "2024-03-05", &[("Z", 2), ("B", 1), ("Q", 4)])],
    );
    let pages = layout(&input, &DateFilter::All);
    let ids: Vec<String> = pages[0]
        .find_all("CardIdentifier")
        .into_iter()
        .map(text_of)
        .collect();
    assert_eq!(ids, vec!["B", "Q", "Z"]);
    assert_eq!(count(&pages, "LevelMark"), 3);
}

#[test]
fn test_date_filter_without_matches_omits_scorecards() {
    let input = make_input(
        vec![item("A", "Lee")],
        vec![Evaluation::new("Ana", "2024-03-05", &[("A", 1)])],
    );
    let filter = DateFilter::parse("2030-01-01");
    let pages = layout(&input, &filter);
    assert_eq!(count(&pages, "TableRow"), 1);
    assert_eq!(count(&pages, "SectionTitle"), 0);
    assert_eq!(count(&pages, "Card"), 0);

    let rendered = report().render(&input, &filter).unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.file_name, "evaluaciones_2030-01-01.pdf");
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn test_nothing_crosses_the_bottom_margin() {
    let pages = layout(&large_input(), &DateFilter::All);
    assert!(pages.len() > 1, "expected several pages, got {}", pages.len());

    let limit = bottom_limit();
    for (i, page) in pages.iter().enumerate() {
        for kind in ["TableHeader", "TableRow", "SectionTitle", "Card"] {
            for element in page.find_all(kind) {
                assert!(
                    element.bottom() <= limit + 1e-6,
                    "{kind} on page {} ends at {:.2}",
                    i + 1,
                    element.bottom()
                );
            }
        }
    }
    assert_eq!(count(&pages, "TableRow"), 12);
    assert_eq!(count(&pages, "Card"), 40);
    assert_eq!(count(&pages, "SectionTitle"), 1);
}

#[test]
fn test_every_page_has_numbered_footer() {
    let pages = layout(&large_input(), &DateFilter::All);
    let total = pages.len();
    for (i, page) in pages.iter().enumerate() {
        let footers = page.find_all("PageFooter");
        assert_eq!(footers.len(), 1);
        assert_eq!(text_of(footers[0]), format!("Página {} de {}", i + 1, total));
        assert_eq!(
            text_of(page.find_all("PageHeader")[0]),
            "INFORME DE EVALUACIÓN CONTINUA"
        );
    }
}

#[test]
fn test_generated_on_in_footer() {
    let config = ReportConfig {
        generated_on: Some("Generado el 2024-03-05".to_string()),
        ..Default::default()
    };
    let pages = Report::new(config)
        .unwrap()
        .layout(&make_input(vec![], vec![]), &DateFilter::All)
        .unwrap();
    let footer = pages[0].find_all("PageFooter")[0];
    assert_eq!(footer.children.len(), 2);
    assert_eq!(
        footer.children[1].text_content().as_deref(),
        Some("Generado el 2024-03-05")
    );
}

#[test]
fn test_oversized_card_fails_the_render() {
    let ids: Vec<String> = (0..50).map(|i| format!("X{i:02}")).collect();
    let levels: Vec<(&str, u8)> = ids.iter().map(|id| (id.as_str(), 2)).collect();
    let input = make_input(vec![], vec![Evaluation::new("Ana", "2024-03-05", &levels)]);
    let err = report().render(&input, &DateFilter::All).unwrap_err();
    assert!(matches!(err, ReportError::Oversized { .. }), "got {err}");
    assert!(err.to_string().contains("printable height"));
}

#[test]
fn test_page_tall_row_renders_without_header() {
    let tall = vec!["x"; 63].join("\n");
    let input = make_input(
        vec![item("A", &tall)],
        vec![Evaluation::new("Ana", "2024-03-05", &[("A", 2)])],
    );
    let rendered = report().render(&input, &DateFilter::All).unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.page_count, 2);

    let pages = layout(&input, &DateFilter::All);
    assert_eq!(count(&pages, "TableHeader"), 0);
    assert_eq!(count(&pages, "TableRow"), 1);
    assert_eq!(pages[1].find_all("SectionTitle").len(), 1);
    assert_eq!(pages[1].find_all("Card").len(), 1);
}

// ─── Determinism ────────────────────────────────────────────────

#[test]
fn test_same_input_same_bytes() {
    let input = large_input();
    let report = report();
    let a = report.render(&input, &DateFilter::All).unwrap();
    let b = report.render(&input, &DateFilter::All).unwrap();
    assert_valid_pdf(&a.bytes);
    assert_eq!(a.bytes, b.bytes, "rendering is not deterministic");
    assert_eq!(a.page_count, b.page_count);
}

#[test]
fn test_page_count_matches_pdf() {
    let rendered = report().render(&large_input(), &DateFilter::All).unwrap();
    let marker = format!("/Count {}", rendered.page_count);
    assert!(
        rendered
            .bytes
            .windows(marker.len())
            .any(|w| w == marker.as_bytes()),
        "page tree does not report {} pages",
        rendered.page_count
    );
}
