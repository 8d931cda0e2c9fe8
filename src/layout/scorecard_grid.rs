//! # Scorecard Grid
//!
//! One card per evaluation, laid out row-major in a fixed number of
//! columns. A card lists each evaluated item with the levels `1..4`; the
//! recorded level is drawn bold over a filled circle.
//!
//! Cards in a row share the row's top edge, and the row is as tall as its
//! tallest card. Rows, not cards, are the unit of pagination.

use super::{Cursor, DrawCommand, LayoutElement, LayoutEngine, PageSet};
use crate::error::ReportError;
use crate::model::{Evaluation, Rubric, LEVEL_COUNT};
use crate::style::{Color, FontSpec, FontStyle, TextAlign};
use crate::text::BrokenLine;

/// One item line of a card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardEntry {
    pub identifier: String,
    /// Level to highlight; `None` when nothing valid was recorded.
    pub selected: Option<u8>,
    /// Whether the rubric still has this item.
    pub known: bool,
}

/// Geometry of one card, computed before it is drawn.
#[derive(Debug, Clone)]
pub struct RenderCard {
    /// Student display name, already truncated to the card width.
    pub title: String,
    pub entries: Vec<CardEntry>,
    pub height: f64,
}

/// Order an evaluation's levels for display: items the rubric knows, in
/// rubric order, then identifiers it does not know, ascending.
pub fn card_entries(evaluation: &Evaluation, rubric: &Rubric) -> Vec<CardEntry> {
    let mut known: Vec<(usize, CardEntry)> = Vec::new();
    let mut unknown = Vec::new();

    for (identifier, level) in &evaluation.levels {
        let entry = CardEntry {
            identifier: identifier.clone(),
            selected: level.selected(),
            known: false,
        };
        match rubric.position(identifier) {
            Some(pos) => known.push((pos, CardEntry { known: true, ..entry })),
            None => unknown.push(entry),
        }
    }

    known.sort_by_key(|(pos, _)| *pos);
    // `levels` is a BTreeMap, so `unknown` is already ascending.
    known.into_iter().map(|(_, e)| e).chain(unknown).collect()
}

impl LayoutEngine<'_> {
    pub fn measure_card(&self, evaluation: &Evaluation, rubric: &Rubric) -> RenderCard {
        let font = self.bold(self.config.card_font_size);
        let max_width = (self.config.card_width() - 2.0 * self.config.cell_margin).max(0.0);
        let title = self.text_layout.truncate_to_width(
            self.font_context,
            &evaluation.student,
            max_width,
            &font,
        );
        let entries = card_entries(evaluation, rubric);
        let height = self.config.card_header_height
            + entries.len() as f64 * self.config.card_row_height
            + self.config.card_spacing;
        RenderCard {
            title,
            entries,
            height,
        }
    }

    /// Draw the section title and the cards. No evaluations draws nothing.
    pub fn layout_scorecard_grid(
        &self,
        rubric: &Rubric,
        evaluations: &[&Evaluation],
        cursor: Cursor,
        pages: &mut PageSet,
    ) -> Result<Cursor, ReportError> {
        if evaluations.is_empty() {
            return Ok(cursor);
        }

        let cards: Vec<RenderCard> = evaluations
            .iter()
            .map(|e| self.measure_card(e, rubric))
            .collect();
        let columns = self.config.grid_columns.max(1);
        let mut cursor = cursor;

        for (index, row) in cards.chunks(columns).enumerate() {
            let row_height = row.iter().map(|c| c.height).fold(0.0, f64::max);
            let what = format!("scorecard row {}", index + 1);

            if index == 0 && !self.config.section_title.is_empty() {
                let title_height = self.config.section_title_height;
                let (top, with_title) =
                    pages.ensure_room_with_lead(cursor, title_height, row_height, &what)?;
                cursor = top;
                if with_title {
                    cursor = self.draw_section_title(cursor, pages)?;
                }
            } else {
                cursor = pages.ensure_room(cursor, row_height, &what)?;
            }

            for (column, card) in row.iter().enumerate() {
                let pitch = self.config.card_width() + self.config.card_gap;
                let x = cursor.x + column as f64 * pitch;
                let element = self.card_element(card, x, cursor.y);
                pages.place(cursor, element)?;
            }
            cursor.y += row_height;
        }

        Ok(cursor)
    }

    fn draw_section_title(
        &self,
        cursor: Cursor,
        pages: &mut PageSet,
    ) -> Result<Cursor, ReportError> {
        let font = self.bold(self.config.title_font_size * 0.8);
        let height = self.config.section_title_height;
        let line = BrokenLine {
            text: self.config.section_title.clone(),
            width: self
                .text_layout
                .measure_width(self.font_context, &self.config.section_title, &font),
        };
        let mut element = self.cell_text(
            vec![line],
            cursor.x,
            self.frame().content_width,
            cursor.y,
            height,
            &font,
            TextAlign::Left,
        );
        element.node_type = Some("SectionTitle".to_string());
        pages.place(cursor, element)?;
        Ok(Cursor {
            y: cursor.y + height,
            ..cursor
        })
    }

    fn card_element(&self, card: &RenderCard, x: f64, y: f64) -> LayoutElement {
        let width = self.config.card_width();
        let header_height = self.config.card_header_height;
        let row_height = self.config.card_row_height;
        let id_width = self.config.card_identifier_width;
        let level_width = (width - id_width) / LEVEL_COUNT as f64;
        let bold = self.bold(self.config.card_font_size);
        let regular = self.font(self.config.card_font_size);
        // Identifiers the rubric no longer has.
        let drifted = FontSpec {
            style: FontStyle::Italic,
            ..regular.clone()
        };
        let border = |background: Option<Color>| DrawCommand::Rect {
            background,
            border_width: self.config.border_width,
            border_color: Color::BLACK,
        };

        let mut children = Vec::with_capacity(card.entries.len() + 2);

        let title = self.single_line(&card.title, &bold);
        children.push(
            LayoutElement::new(
                x,
                y,
                width,
                header_height,
                border(Some(self.config.card_header_fill)),
                "CardHeader",
            )
            .with_children(vec![self.cell_text(
                vec![title],
                x,
                width,
                y,
                header_height,
                &bold,
                TextAlign::Center,
            )]),
        );

        let mut row_y = y + header_height;
        for entry in &card.entries {
            let mut cells = Vec::with_capacity(LEVEL_COUNT + 1);
            let id_font = if entry.known { &bold } else { &drifted };
            let id_line = self.single_line(&entry.identifier, id_font);
            cells.push(
                LayoutElement::new(x, row_y, id_width, row_height, border(None), "CardIdentifier")
                    .with_children(vec![self.cell_text(
                        vec![id_line],
                        x,
                        id_width,
                        row_y,
                        row_height,
                        id_font,
                        TextAlign::Center,
                    )]),
            );

            for level in 1..=LEVEL_COUNT as u8 {
                let cell_x = x + id_width + (level - 1) as f64 * level_width;
                let selected = entry.selected == Some(level);
                let font = if selected { &bold } else { &regular };
                let mut level_children = Vec::with_capacity(2);
                if selected {
                    let d = self.config.mark_diameter;
                    level_children.push(LayoutElement::new(
                        cell_x + (level_width - d) / 2.0,
                        row_y + (row_height - d) / 2.0,
                        d,
                        d,
                        DrawCommand::Ellipse {
                            fill: self.config.mark_fill,
                        },
                        "LevelMark",
                    ));
                }
                let label = self.single_line(&level.to_string(), font);
                level_children.push(self.cell_text(
                    vec![label],
                    cell_x,
                    level_width,
                    row_y,
                    row_height,
                    font,
                    TextAlign::Center,
                ));
                cells.push(
                    LayoutElement::new(
                        cell_x,
                        row_y,
                        level_width,
                        row_height,
                        border(None),
                        "LevelCell",
                    )
                    .with_children(level_children),
                );
            }

            children.push(
                LayoutElement::new(x, row_y, width, row_height, DrawCommand::None, "CardItem")
                    .with_children(cells),
            );
            row_y += row_height;
        }

        children.push(LayoutElement::new(
            x,
            row_y,
            width,
            0.0,
            DrawCommand::Line {
                color: Color::BLACK,
                width: self.config.rule_width,
            },
            "CardRule",
        ));

        LayoutElement::new(x, y, width, card.height, DrawCommand::None, "Card")
            .with_children(children)
    }
}
