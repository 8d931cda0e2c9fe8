//! # Page-Aware Layout Engine
//!
//! The report is laid out directly into pages. There is no tall canvas that
//! gets sliced afterwards: before every table row or row of cards the engine
//! asks whether the block fits on the current page, and moves to a new page
//! first when it does not. A block is never split.
//!
//! The position on the page is an explicit [`Cursor`] value. Each draw
//! operation takes a cursor and returns the cursor after what it drew; the
//! only mutable state is the [`PageSet`] being filled by the one render in
//! progress.
//!
//! Coordinates are millimetres from the top-left corner of the page.

pub mod page_break;
pub mod reference_table;
pub mod scorecard_grid;

use tracing::debug;

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::font::FontContext;
use crate::model::{Evaluation, Rubric};
use crate::style::{pt_to_mm, Color, FontSpec, TextAlign};
use crate::text::{BrokenLine, TextLayout};
use page_break::{decide_break, keep_together, BreakDecision};

pub use reference_table::RenderRow;
pub use scorecard_grid::{CardEntry, RenderCard};

/// Where the next block goes: x/y on page `page` (0-based).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
    pub page: usize,
}

/// Page size and the area body content may occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    pub width: f64,
    pub height: f64,
    pub content_left: f64,
    pub content_width: f64,
    /// First y available to body content (below the running header).
    pub body_top: f64,
    /// No block may extend below this y.
    pub bottom_limit: f64,
}

impl PageFrame {
    pub fn from_config(config: &ReportConfig) -> Self {
        let (width, height) = config.page_size.dimensions();
        Self {
            width,
            height,
            content_left: config.margin.left,
            content_width: config.content_width(),
            body_top: config.margin.top + config.header_height,
            bottom_limit: height - config.margin.bottom,
        }
    }

    /// Body height available on an empty page.
    pub fn printable_height(&self) -> f64 {
        self.bottom_limit - self.body_top
    }
}

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    /// Every element on the page (depth-first) whose node type is `node_type`.
    pub fn find_all(&self, node_type: &str) -> Vec<&LayoutElement> {
        let mut found = Vec::new();
        for element in &self.elements {
            element.collect(node_type, &mut found);
        }
        found
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Absolute position on the page (top-left corner).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// The visual properties to draw.
    pub draw: DrawCommand,
    /// Child elements (positioned relative to page, not parent).
    pub children: Vec<LayoutElement>,
    /// Logical element type, e.g. "TableRow", "TableCell", "Card".
    pub node_type: Option<String>,
}

impl LayoutElement {
    fn new(x: f64, y: f64, width: f64, height: f64, draw: DrawCommand, node_type: &str) -> Self {
        Self {
            x,
            y,
            width,
            height,
            draw,
            children: Vec::new(),
            node_type: Some(node_type.to_string()),
        }
    }

    fn with_children(mut self, children: Vec<LayoutElement>) -> Self {
        self.children = children;
        self
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is(&self, node_type: &str) -> bool {
        self.node_type.as_deref() == Some(node_type)
    }

    /// Concatenated text drawn by this element, if it is a text element.
    pub fn text_content(&self) -> Option<String> {
        match &self.draw {
            DrawCommand::Text { lines, .. } => Some(
                lines
                    .iter()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }

    fn collect<'a>(&'a self, node_type: &str, found: &mut Vec<&'a LayoutElement>) {
        if self.is(node_type) {
            found.push(self);
        }
        for child in &self.children {
            child.collect(node_type, found);
        }
    }
}

/// What to actually draw for this element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Nothing to draw (just a layout container).
    None,
    /// Draw a rectangle: optional fill, optional uniform border.
    Rect {
        background: Option<Color>,
        border_width: f64,
        border_color: Color,
    },
    /// Draw text lines in one font.
    Text {
        lines: Vec<TextLine>,
        font: FontSpec,
        color: Color,
    },
    /// Fill the ellipse inscribed in the element's box.
    Ellipse { fill: Color },
    /// Stroke a line from (x, y) to (x + width, y + height).
    Line { color: Color, width: f64 },
}

/// One line of text; `y` is the baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub width: f64,
}

/// The pages of the render in progress.
#[derive(Debug)]
pub struct PageSet {
    frame: PageFrame,
    pages: Vec<LayoutPage>,
}

impl PageSet {
    /// A page set with its first page open; returns the starting cursor.
    pub fn open(frame: PageFrame) -> (Self, Cursor) {
        let mut set = Self {
            frame,
            pages: Vec::new(),
        };
        let cursor = set.new_page();
        (set, cursor)
    }

    pub fn frame(&self) -> &PageFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Start a new page and return a cursor at the top of its body.
    pub fn new_page(&mut self) -> Cursor {
        self.pages.push(LayoutPage {
            width: self.frame.width,
            height: self.frame.height,
            elements: Vec::new(),
        });
        Cursor {
            x: self.frame.content_left,
            y: self.frame.body_top,
            page: self.pages.len() - 1,
        }
    }

    /// Body height left below `cursor` on its page.
    pub fn remaining_height(&self, cursor: Cursor) -> f64 {
        (self.frame.bottom_limit - cursor.y).max(0.0)
    }

    /// Make room for an unbreakable block of `height`.
    ///
    /// Returns the cursor to draw at: `cursor` itself when the block fits,
    /// otherwise the top of a new page. Fails when the block is taller than
    /// an empty page.
    pub fn ensure_room(
        &mut self,
        cursor: Cursor,
        height: f64,
        what: &str,
    ) -> Result<Cursor, ReportError> {
        check_extent(what, height)?;
        match decide_break(
            self.remaining_height(cursor),
            height,
            self.frame.printable_height(),
        ) {
            BreakDecision::Place => Ok(cursor),
            BreakDecision::MoveToNextPage => {
                let next = self.new_page();
                debug!(
                    block = what,
                    height,
                    from_page = cursor.page + 1,
                    to_page = next.page + 1,
                    "page break"
                );
                Ok(next)
            }
            BreakDecision::Oversized => Err(ReportError::Oversized {
                what: what.to_string(),
                height,
                available: self.frame.printable_height(),
            }),
        }
    }

    /// Make room for a block together with a `lead` drawn above it, such as
    /// a table header or a section title.
    ///
    /// The pair is kept on one page when it fits an empty page. Otherwise
    /// only the block is placed and the returned flag is `false`, telling
    /// the caller to skip the lead. The block alone still fails when it is
    /// taller than an empty page.
    pub fn ensure_room_with_lead(
        &mut self,
        cursor: Cursor,
        lead: f64,
        height: f64,
        what: &str,
    ) -> Result<(Cursor, bool), ReportError> {
        check_extent(what, lead)?;
        let grouped = keep_together(&[lead, height]);
        if grouped <= self.frame.printable_height() {
            return Ok((self.ensure_room(cursor, grouped, what)?, true));
        }
        debug!(block = what, lead, height, "lead dropped, block fills a page");
        Ok((self.ensure_room(cursor, height, what)?, false))
    }

    /// Add an element to the page the cursor is on.
    pub fn place(&mut self, cursor: Cursor, element: LayoutElement) -> Result<(), ReportError> {
        check_geometry(&element)?;
        if element.bottom() > self.frame.bottom_limit + 1e-6 {
            return Err(ReportError::Layout(format!(
                "{} at y={:.2} overflows the bottom margin ({:.2})",
                element.node_type.as_deref().unwrap_or("element"),
                element.bottom(),
                self.frame.bottom_limit
            )));
        }
        let page = self.pages.get_mut(cursor.page).ok_or_else(|| {
            ReportError::Layout(format!("cursor points at missing page {}", cursor.page))
        })?;
        page.elements.push(element);
        Ok(())
    }

    pub fn into_pages(self) -> Vec<LayoutPage> {
        self.pages
    }
}

/// Reject negative or non-finite heights before anything is drawn.
fn check_extent(what: &str, height: f64) -> Result<(), ReportError> {
    if !height.is_finite() || height < 0.0 {
        return Err(ReportError::Layout(format!(
            "{what} has degenerate height {height}"
        )));
    }
    Ok(())
}

fn check_geometry(element: &LayoutElement) -> Result<(), ReportError> {
    let values = [element.x, element.y, element.width, element.height];
    if values.iter().any(|v| !v.is_finite()) || element.width < 0.0 || element.height < 0.0 {
        return Err(ReportError::Layout(format!(
            "{} has degenerate geometry ({:.2}, {:.2}, {:.2} x {:.2})",
            element.node_type.as_deref().unwrap_or("element"),
            element.x,
            element.y,
            element.width,
            element.height
        )));
    }
    element.children.iter().try_for_each(check_geometry)
}

/// The main layout engine.
pub struct LayoutEngine<'a> {
    config: &'a ReportConfig,
    font_context: &'a FontContext,
    text_layout: TextLayout,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a ReportConfig, font_context: &'a FontContext) -> Self {
        Self {
            config,
            font_context,
            text_layout: TextLayout::new(),
        }
    }

    pub fn frame(&self) -> PageFrame {
        PageFrame::from_config(self.config)
    }

    /// Lay out the reference table followed by the scorecard grid, then add
    /// the running header and footer to every page.
    pub fn layout(
        &self,
        title: &str,
        rubric: &Rubric,
        evaluations: &[&Evaluation],
    ) -> Result<Vec<LayoutPage>, ReportError> {
        let (mut pages, cursor) = PageSet::open(self.frame());

        let cursor = self.layout_reference_table(rubric, cursor, &mut pages)?;
        let cursor = self.layout_scorecard_grid(rubric, evaluations, cursor, &mut pages)?;

        debug!(
            items = rubric.len(),
            cards = evaluations.len(),
            pages = pages.len(),
            end_y = cursor.y,
            "report laid out"
        );

        let mut pages = pages.into_pages();
        self.inject_page_chrome(title, &mut pages);
        Ok(pages)
    }

    /// Wrap `text` for a cell `width` wide, honouring the cell margin.
    fn wrap_cell(&self, text: &str, width: f64, font: &FontSpec) -> Vec<BrokenLine> {
        let max_width = (width - 2.0 * self.config.cell_margin).max(0.0);
        self.text_layout
            .break_into_lines(self.font_context, text, max_width, font)
    }

    fn line_count(&self, text: &str, width: f64, font: &FontSpec) -> usize {
        self.text_layout.line_count(
            self.font_context,
            text,
            width,
            self.config.cell_margin,
            font,
            self.frame().content_width,
        )
    }

    /// Baseline of a line whose box starts at `line_top`.
    fn baseline(&self, line_top: f64, line_height: f64, font: &FontSpec) -> f64 {
        line_top + 0.5 * line_height + 0.3 * pt_to_mm(font.size)
    }

    /// A text element for pre-broken lines inside a cell box.
    #[allow(clippy::too_many_arguments)]
    fn cell_text(
        &self,
        lines: Vec<BrokenLine>,
        cell_x: f64,
        cell_width: f64,
        block_top: f64,
        line_height: f64,
        font: &FontSpec,
        align: TextAlign,
    ) -> LayoutElement {
        let margin = self.config.cell_margin;
        let height = lines.len() as f64 * line_height;
        let text_lines = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let x = match align {
                    TextAlign::Left => cell_x + margin,
                    TextAlign::Center => cell_x + (cell_width - line.width) / 2.0,
                    TextAlign::Right => cell_x + cell_width - margin - line.width,
                };
                TextLine {
                    x,
                    y: self.baseline(block_top + i as f64 * line_height, line_height, font),
                    text: line.text,
                    width: line.width,
                }
            })
            .collect();
        LayoutElement::new(
            cell_x,
            block_top,
            cell_width,
            height,
            DrawCommand::Text {
                lines: text_lines,
                font: font.clone(),
                color: Color::BLACK,
            },
            "Text",
        )
    }

    fn font(&self, size: f64) -> FontSpec {
        FontSpec::regular(&self.config.font_family, size)
    }

    fn bold(&self, size: f64) -> FontSpec {
        FontSpec::bold(&self.config.font_family, size)
    }

    /// Add the running title and the page-number footer to every page.
    ///
    /// Runs after layout, when the total page count is known.
    fn inject_page_chrome(&self, title: &str, pages: &mut [LayoutPage]) {
        let frame = self.frame();
        let total = pages.len();
        let title_font = self.bold(self.config.title_font_size);
        let footer_font = self.font(self.config.footer_font_size);
        let title_height = pt_to_mm(self.config.title_font_size) * 1.5;
        let footer_height = pt_to_mm(self.config.footer_font_size) * 1.5;
        let footer_top = frame.height - self.config.footer_offset - footer_height / 2.0;

        for (idx, page) in pages.iter_mut().enumerate() {
            let mut header = Vec::new();
            if !title.is_empty() {
                let line = self.single_line(title, &title_font);
                header.push(self.cell_text(
                    vec![line],
                    frame.content_left,
                    frame.content_width,
                    self.config.margin.top,
                    title_height,
                    &title_font,
                    TextAlign::Center,
                ));
            }

            let label = self
                .config
                .footer_label
                .replace("{page}", &(idx + 1).to_string())
                .replace("{pages}", &total.to_string());
            let mut footer = vec![self.cell_text(
                vec![self.single_line(&label, &footer_font)],
                frame.content_left,
                frame.content_width,
                footer_top,
                footer_height,
                &footer_font,
                TextAlign::Center,
            )];
            if let Some(generated_on) = &self.config.generated_on {
                footer.push(self.cell_text(
                    vec![self.single_line(generated_on, &footer_font)],
                    frame.content_left,
                    frame.content_width,
                    footer_top,
                    footer_height,
                    &footer_font,
                    TextAlign::Left,
                ));
            }

            let header = LayoutElement::new(
                frame.content_left,
                self.config.margin.top,
                frame.content_width,
                title_height,
                DrawCommand::None,
                "PageHeader",
            )
            .with_children(header);
            let footer = LayoutElement::new(
                frame.content_left,
                footer_top,
                frame.content_width,
                footer_height,
                DrawCommand::None,
                "PageFooter",
            )
            .with_children(footer);

            let mut elements = vec![header];
            elements.append(&mut page.elements);
            elements.push(footer);
            page.elements = elements;
        }
    }

    fn single_line(&self, text: &str, font: &FontSpec) -> BrokenLine {
        BrokenLine {
            text: text.to_string(),
            width: self.text_layout.measure_width(self.font_context, text, font),
        }
    }
}
