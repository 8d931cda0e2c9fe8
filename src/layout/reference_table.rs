//! # Reference Table
//!
//! The rubric printed as a six-column table: identifier, description and
//! the four level descriptors. Every cell of a row is as tall as the
//! tallest wrapped cell, and a row never straddles a page.

use super::{Cursor, DrawCommand, LayoutElement, LayoutEngine, PageSet};
use crate::error::ReportError;
use crate::model::{Rubric, RubricItem};
use crate::style::{Color, FontSpec, TextAlign};

/// Geometry of one rubric row, computed before it is drawn.
#[derive(Debug, Clone)]
pub struct RenderRow<'a> {
    pub item: &'a RubricItem,
    /// Wrapped line count per column.
    pub line_counts: [usize; 6],
    pub height: f64,
}

impl RenderRow<'_> {
    pub fn max_lines(&self) -> usize {
        self.line_counts.iter().copied().max().unwrap_or(1)
    }
}

impl LayoutEngine<'_> {
    /// Font for column `index` of a body row; the identifier is bold.
    fn row_font(&self, index: usize) -> FontSpec {
        if index == 0 {
            self.bold(self.config.body_font_size)
        } else {
            self.font(self.config.body_font_size)
        }
    }

    /// Wrap every field of `item` and derive the row height.
    pub fn measure_rubric_row<'i>(&self, item: &'i RubricItem) -> RenderRow<'i> {
        let mut line_counts = [1; 6];
        for (i, field) in item.fields().iter().enumerate() {
            line_counts[i] =
                self.line_count(field, self.config.column_widths[i], &self.row_font(i));
        }
        let max_lines = line_counts.iter().copied().max().unwrap_or(1);
        let height =
            (max_lines as f64 * self.config.line_height).max(self.config.min_row_height());
        RenderRow {
            item,
            line_counts,
            height,
        }
    }

    /// Height of the column header row.
    pub fn table_header_height(&self) -> f64 {
        let font = self.bold(self.config.header_font_size);
        let lines = self
            .config
            .column_labels
            .iter()
            .zip(self.config.column_widths)
            .map(|(label, width)| self.line_count(label, width, &font))
            .max()
            .unwrap_or(1);
        (lines as f64 * self.config.line_height).max(self.config.header_row_height)
    }

    /// Draw the rubric table starting at `cursor`. An empty rubric draws
    /// nothing.
    pub fn layout_reference_table(
        &self,
        rubric: &Rubric,
        cursor: Cursor,
        pages: &mut PageSet,
    ) -> Result<Cursor, ReportError> {
        let rows: Vec<RenderRow> = rubric
            .items()
            .iter()
            .map(|item| self.measure_rubric_row(item))
            .collect();
        let Some(first) = rows.first() else {
            return Ok(cursor);
        };

        let header_height = self.table_header_height();
        let (mut cursor, with_header) = pages.ensure_room_with_lead(
            cursor,
            header_height,
            first.height,
            &format!("rubric row {}", first.item.identifier),
        )?;
        if with_header {
            cursor = self.draw_table_header(cursor, header_height, pages)?;
        }

        for row in &rows {
            let what = format!("rubric row {}", row.item.identifier);
            let mut at = pages.ensure_room(cursor, row.height, &what)?;
            if at.page != cursor.page && self.config.repeat_header {
                let (top, with_header) =
                    pages.ensure_room_with_lead(at, header_height, row.height, &what)?;
                at = top;
                if with_header {
                    at = self.draw_table_header(at, header_height, pages)?;
                }
            }
            cursor = self.draw_rubric_row(row, at, pages)?;
        }

        Ok(Cursor {
            y: cursor.y + self.config.section_spacing,
            ..cursor
        })
    }

    fn draw_table_header(
        &self,
        cursor: Cursor,
        height: f64,
        pages: &mut PageSet,
    ) -> Result<Cursor, ReportError> {
        let font = self.bold(self.config.header_font_size);
        let lh = self.config.line_height;
        let mut x = cursor.x;
        let mut cells = Vec::with_capacity(6);

        for (label, width) in self.config.column_labels.iter().zip(self.config.column_widths) {
            let lines = self.wrap_cell(label, width, &font);
            let top = cursor.y + (height - lines.len() as f64 * lh) / 2.0;
            let text = self.cell_text(lines, x, width, top, lh, &font, TextAlign::Center);
            cells.push(
                LayoutElement::new(
                    x,
                    cursor.y,
                    width,
                    height,
                    DrawCommand::Rect {
                        background: Some(self.config.header_fill),
                        border_width: self.config.border_width,
                        border_color: Color::BLACK,
                    },
                    "TableHeaderCell",
                )
                .with_children(vec![text]),
            );
            x += width;
        }

        let row = LayoutElement::new(
            cursor.x,
            cursor.y,
            self.config.table_width,
            height,
            DrawCommand::None,
            "TableHeader",
        )
        .with_children(cells);
        pages.place(cursor, row)?;

        Ok(Cursor {
            y: cursor.y + height,
            ..cursor
        })
    }

    fn draw_rubric_row(
        &self,
        row: &RenderRow,
        cursor: Cursor,
        pages: &mut PageSet,
    ) -> Result<Cursor, ReportError> {
        let lh = self.config.line_height;
        let inset = (row.height - row.max_lines() as f64 * lh) / 2.0;
        let mut x = cursor.x;
        let mut cells = Vec::with_capacity(6);

        for (i, field) in row.item.fields().iter().enumerate() {
            let width = self.config.column_widths[i];
            let font = self.row_font(i);
            let align = if i == 0 {
                TextAlign::Center
            } else {
                TextAlign::Left
            };
            let lines = self.wrap_cell(field, width, &font);
            let text = self.cell_text(lines, x, width, cursor.y + inset, lh, &font, align);
            cells.push(
                LayoutElement::new(
                    x,
                    cursor.y,
                    width,
                    row.height,
                    DrawCommand::Rect {
                        background: None,
                        border_width: self.config.border_width,
                        border_color: Color::BLACK,
                    },
                    "TableCell",
                )
                .with_children(vec![text]),
            );
            x += width;
        }

        let element = LayoutElement::new(
            cursor.x,
            cursor.y,
            self.config.table_width,
            row.height,
            DrawCommand::None,
            "TableRow",
        )
        .with_children(cells);
        pages.place(cursor, element)?;

        Ok(Cursor {
            y: cursor.y + row.height,
            ..cursor
        })
    }
}
