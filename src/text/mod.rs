//! # Text Layout
//!
//! Word wrapping and text measurement for table cells.
//!
//! Every cell in the report is wrapped by [`TextLayout::break_into_lines`],
//! so the row-height calculation and the drawing code always agree on how
//! many lines a cell holds. Widths come from the standard font metrics in
//! [`FontContext`] and are returned in layout millimetres.

use crate::font::FontContext;
use crate::style::{pt_to_mm, FontSpec};

/// Slack for comparing accumulated float widths against a column width.
const WIDTH_EPSILON: f64 = 1e-9;

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    /// The text as a string.
    pub text: String,
    /// Total width of the line in millimetres.
    pub width: f64,
}

impl BrokenLine {
    fn empty() -> Self {
        Self {
            text: String::new(),
            width: 0.0,
        }
    }
}

pub struct TextLayout;

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break a string into lines that fit within `max_width` millimetres.
    ///
    /// Greedy: words are appended while the line stays within `max_width`.
    /// Newlines always end a line. A word wider than `max_width` sits alone
    /// on its own line and is never split or truncated. Empty and
    /// whitespace-only text yields exactly one empty line.
    pub fn break_into_lines(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        font: &FontSpec,
    ) -> Vec<BrokenLine> {
        if text.trim().is_empty() {
            return vec![BrokenLine::empty()];
        }

        let space_width = self.measure_width(font_context, " ", font);
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let paragraph = paragraph.trim_end_matches('\r');
            let mut current = String::new();
            let mut current_width = 0.0;

            for word in paragraph.split_whitespace() {
                let word_width = self.measure_width(font_context, word, font);

                if current.is_empty() {
                    current.push_str(word);
                    current_width = word_width;
                    continue;
                }

                let candidate = current_width + space_width + word_width;
                if candidate <= max_width + WIDTH_EPSILON {
                    current.push(' ');
                    current.push_str(word);
                    current_width = candidate;
                } else {
                    lines.push(BrokenLine {
                        text: std::mem::take(&mut current),
                        width: current_width,
                    });
                    current.push_str(word);
                    current_width = word_width;
                }
            }

            lines.push(BrokenLine {
                text: current,
                width: current_width,
            });
        }

        lines
    }

    /// Number of lines `text` occupies in a column `column_width` wide.
    ///
    /// `cell_margin` is the inner margin on each side of the cell. A
    /// non-positive `column_width` means the text may use `fallback_width`
    /// (the remaining width of the page from the cursor).
    pub fn line_count(
        &self,
        font_context: &FontContext,
        text: &str,
        column_width: f64,
        cell_margin: f64,
        font: &FontSpec,
        fallback_width: f64,
    ) -> usize {
        let width = if column_width > 0.0 {
            column_width
        } else {
            fallback_width
        };
        let max_width = (width - 2.0 * cell_margin).max(0.0);
        self.break_into_lines(font_context, text, max_width, font).len()
    }

    /// Measure the width of a string on a single line, in millimetres.
    pub fn measure_width(&self, font_context: &FontContext, text: &str, font: &FontSpec) -> f64 {
        pt_to_mm(font_context.measure_string(text, font))
    }

    /// Shorten `text` with a trailing `...` until it fits in `max_width`.
    pub fn truncate_to_width(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        font: &FontSpec,
    ) -> String {
        if self.measure_width(font_context, text, font) <= max_width + WIDTH_EPSILON {
            return text.to_string();
        }

        let ellipsis = "...";
        let budget = max_width - self.measure_width(font_context, ellipsis, font);
        let mut kept = String::new();
        let mut width = 0.0;
        for ch in text.chars() {
            let w = pt_to_mm(font_context.char_width(
                ch,
                &font.family,
                font.weight,
                font.is_italic(),
                font.size,
            ));
            if width + w > budget + WIDTH_EPSILON {
                break;
            }
            kept.push(ch);
            width += w;
        }

        let mut truncated = kept.trim_end().to_string();
        truncated.push_str(ellipsis);
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FontContext {
        FontContext::new()
    }

    fn body() -> FontSpec {
        FontSpec::regular("Helvetica", 8.0)
    }

    #[test]
    fn test_empty_string_is_one_line() {
        let tl = TextLayout::new();
        let lines = tl.break_into_lines(&ctx(), "", 50.0, &body());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "");
        assert_eq!(tl.line_count(&ctx(), "", 50.0, 1.0, &body(), 190.0), 1);
    }

    #[test]
    fn test_whitespace_only_is_one_line() {
        let tl = TextLayout::new();
        assert_eq!(tl.line_count(&ctx(), "   \t  ", 50.0, 1.0, &body(), 190.0), 1);
        assert_eq!(tl.line_count(&ctx(), " \n \n ", 50.0, 1.0, &body(), 190.0), 1);
    }

    #[test]
    fn test_short_text_fits_one_line() {
        let tl = TextLayout::new();
        let text = "Hello World";
        let width = tl.measure_width(&ctx(), text, &body());
        let column = width + 2.0 + 0.01;
        assert_eq!(tl.line_count(&ctx(), text, column, 1.0, &body(), 190.0), 1);
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        let tl = TextLayout::new();
        let lines = tl.break_into_lines(
            &ctx(),
            "The quick brown fox jumps over the lazy dog",
            20.0,
            &body(),
        );
        assert!(lines.len() > 1, "expected wrapping, got {:?}", lines);
        for line in &lines {
            assert!(!line.text.starts_with(' ') && !line.text.ends_with(' '));
            assert!(line.width <= 20.0 + 1e-6, "line too wide: {:?}", line);
        }
        let rejoined: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            rejoined.join(" "),
            "The quick brown fox jumps over the lazy dog"
        );
    }

    #[test]
    fn test_explicit_newlines_force_breaks() {
        let tl = TextLayout::new();
        let lines = tl.break_into_lines(&ctx(), "uno\ndos\r\ntres", 100.0, &body());
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["uno", "dos", "tres"]);
    }

    #[test]
    fn test_blank_line_between_paragraphs_counts() {
        let tl = TextLayout::new();
        assert_eq!(tl.line_count(&ctx(), "a\n\nb", 100.0, 1.0, &body(), 190.0), 3);
    }

    #[test]
    fn test_long_token_sits_alone_untruncated() {
        let tl = TextLayout::new();
        let token = "Supercalifragilisticexpialidocious";
        let text = format!("a {token} b");
        let lines = tl.break_into_lines(&ctx(), &text, 10.0, &body());
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", token, "b"]);
        assert!(lines[1].width > 10.0);
    }

    #[test]
    fn test_zero_width_column_uses_fallback() {
        let tl = TextLayout::new();
        let text = "palabra ".repeat(12);
        let narrow = tl.line_count(&ctx(), &text, 20.0, 1.0, &body(), 190.0);
        let fallback = tl.line_count(&ctx(), &text, 0.0, 1.0, &body(), 190.0);
        assert_eq!(fallback, 1);
        assert!(narrow > fallback);
    }

    #[test]
    fn test_line_count_is_deterministic() {
        let tl = TextLayout::new();
        let text = "Identifica las ideas principales de un texto expositivo sencillo.";
        let a = tl.line_count(&ctx(), text, 32.5, 1.0, &body(), 190.0);
        let b = tl.line_count(&ctx(), text, 32.5, 1.0, &body(), 190.0);
        assert_eq!(a, b);
        assert!(a >= 1);
    }

    #[test]
    fn test_bold_wraps_no_earlier_than_needed() {
        let tl = TextLayout::new();
        let text = "mmmm mmmm mmmm mmmm mmmm mmmm";
        let regular = tl.line_count(&ctx(), text, 30.0, 1.0, &body(), 190.0);
        let bold = tl.line_count(&ctx(), text, 30.0, 1.0, &FontSpec::bold("Helvetica", 8.0), 190.0);
        assert!(bold >= regular);
    }

    #[test]
    fn test_truncate_keeps_short_names() {
        let tl = TextLayout::new();
        assert_eq!(
            tl.truncate_to_width(&ctx(), "Ana (1ºA)", 50.0, &body()),
            "Ana (1ºA)"
        );
    }

    #[test]
    fn test_truncate_long_names_with_ellipsis() {
        let tl = TextLayout::new();
        let name = "María de los Ángeles Fernández-Villaverde (2º Bachillerato B)";
        let out = tl.truncate_to_width(&ctx(), name, 30.0, &body());
        assert!(out.ends_with("..."), "got {out}");
        assert!(tl.measure_width(&ctx(), &out, &body()) <= 30.0 + 1e-6);
    }
}
