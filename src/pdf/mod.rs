//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer covering the subset a report needs:
//! filled and stroked rectangles, lines, filled ellipses and text in the
//! standard Type1 fonts with WinAnsi encoding. Content streams are
//! FlateDecode-compressed.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Layout coordinates are millimetres from the top-left corner; PDF user
//! space is points from the bottom-left. Every coordinate is converted here
//! and nowhere else.
//!
//! Output is a pure function of the pages: no creation dates, no document
//! IDs, fonts registered in sorted order.

use std::collections::BTreeMap;
use std::io::Write;

use miniz_oxide::deflate::compress_to_vec_zlib;
use tracing::debug;

use crate::font::{FontContext, FontKey};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};
use crate::style::{Color, PT_PER_MM};

/// Bezier control point offset for approximating a quarter circle.
const KAPPA: f64 = 0.552_284_749_8;

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub subject: Option<String>,
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    /// Font key -> resource index (/F0, /F1, ...) and object id.
    font_objects: BTreeMap<FontKey, (usize, usize)>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        info: &DocumentInfo,
        font_context: &FontContext,
    ) -> Vec<u8> {
        // Object 0 is the free-list head; 1 = Catalog, 2 = Pages.
        let mut builder = PdfBuilder {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            font_objects: BTreeMap::new(),
        };

        self.register_fonts(&mut builder, pages, font_context);
        let font_resources = self.build_font_resource_dict(&builder.font_objects);

        let mut page_obj_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.build_content_stream(page, &builder.font_objects);
            let compressed = compress_to_vec_zlib(&content, 6);

            let content_obj_id = builder.objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            builder.objects.push(content_data);

            let page_obj_id = builder.objects.len();
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                page.width * PT_PER_MM,
                page.height * PT_PER_MM,
                content_obj_id,
                font_resources
            );
            builder.objects.push(page_dict.into_bytes());
            page_obj_ids.push(page_obj_id);
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.objects.len();
        let mut info_dict: Vec<u8> = b"<< ".to_vec();
        if let Some(title) = &info.title {
            info_dict.extend_from_slice(b"/Title ");
            write_pdf_string(&mut info_dict, title);
            info_dict.push(b' ');
        }
        if let Some(subject) = &info.subject {
            info_dict.extend_from_slice(b"/Subject ");
            write_pdf_string(&mut info_dict, subject);
            info_dict.push(b' ');
        }
        let _ = write!(
            info_dict,
            "/Producer (rubrica {}) >>",
            env!("CARGO_PKG_VERSION")
        );
        builder.objects.push(info_dict);

        let bytes = self.serialize(&builder, info_obj_id);
        debug!(
            pages = pages.len(),
            fonts = builder.font_objects.len(),
            bytes = bytes.len(),
            "pdf written"
        );
        bytes
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(
        &self,
        page: &LayoutPage,
        font_objects: &BTreeMap<FontKey, (usize, usize)>,
    ) -> Vec<u8> {
        let mut stream = Vec::new();
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, font_objects);
        }
        stream
    }

    /// Write a single layout element, then its children, as PDF operators.
    fn write_element(
        &self,
        stream: &mut Vec<u8>,
        element: &LayoutElement,
        page_height: f64,
        font_objects: &BTreeMap<FontKey, (usize, usize)>,
    ) {
        let x = element.x * PT_PER_MM;
        let w = element.width * PT_PER_MM;
        let h = element.height * PT_PER_MM;
        // Bottom edge in PDF space.
        let y = (page_height - element.y - element.height) * PT_PER_MM;

        match &element.draw {
            DrawCommand::None => {}

            DrawCommand::Rect {
                background,
                border_width,
                border_color,
            } => {
                if let Some(bg) = background {
                    if bg.a > 0.0 {
                        let _ = write!(stream, "q\n{} rg\n", rgb(bg));
                        let _ = write!(stream, "{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n", x, y, w, h);
                    }
                }
                if *border_width > 0.0 {
                    let _ = write!(
                        stream,
                        "q\n{} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                        rgb(border_color),
                        border_width * PT_PER_MM,
                        x,
                        y,
                        w,
                        h
                    );
                }
            }

            DrawCommand::Text { lines, font, color } => {
                let key = FontKey::from_spec(font);
                let index = font_objects.get(&key).map(|(i, _)| *i).unwrap_or(0);
                let _ = write!(
                    stream,
                    "BT\n{} rg\n/F{} {:.1} Tf\n",
                    rgb(color),
                    index,
                    font.size
                );
                for line in lines {
                    let _ = write!(
                        stream,
                        "1 0 0 1 {:.2} {:.2} Tm\n",
                        line.x * PT_PER_MM,
                        (page_height - line.y) * PT_PER_MM
                    );
                    write_pdf_string(stream, &line.text);
                    stream.extend_from_slice(b" Tj\n");
                }
                stream.extend_from_slice(b"ET\n");
            }

            DrawCommand::Ellipse { fill } => {
                let rx = w / 2.0;
                let ry = h / 2.0;
                let cx = x + rx;
                let cy = y + ry;
                let (kx, ky) = (rx * KAPPA, ry * KAPPA);
                let _ = write!(stream, "q\n{} rg\n", rgb(fill));
                let _ = write!(stream, "{:.2} {:.2} m\n", cx + rx, cy);
                let _ = write!(
                    stream,
                    "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
                    cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry
                );
                let _ = write!(
                    stream,
                    "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
                    cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy
                );
                let _ = write!(
                    stream,
                    "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
                    cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry
                );
                let _ = write!(
                    stream,
                    "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
                    cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy
                );
                stream.extend_from_slice(b"f\nQ\n");
            }

            DrawCommand::Line { color, width } => {
                let x1 = x;
                let y1 = (page_height - element.y) * PT_PER_MM;
                let x2 = x + w;
                let y2 = y1 - h;
                let _ = write!(
                    stream,
                    "q\n{} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    rgb(color),
                    width * PT_PER_MM,
                    x1,
                    y1,
                    x2,
                    y2
                );
            }
        }

        for child in &element.children {
            self.write_element(stream, child, page_height, font_objects);
        }
    }

    /// Register fonts used across all pages. Each distinct (family, weight,
    /// italic) gets its own font object; keys are ordered so the same
    /// pages always produce the same object numbers.
    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        font_context: &FontContext,
    ) {
        let mut keys: Vec<FontKey> = Vec::new();
        for page in pages {
            collect_font_keys(&page.elements, &mut keys);
        }
        keys.sort();
        keys.dedup();

        if keys.is_empty() {
            keys.push(FontKey {
                family: "Helvetica".to_string(),
                weight: 400,
                italic: false,
            });
        }

        for (index, key) in keys.into_iter().enumerate() {
            let font = font_context.registry().resolve(&key.family, key.weight, key.italic);
            let obj_id = builder.objects.len();
            builder.objects.push(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.pdf_name()
                )
                .into_bytes(),
            );
            builder.font_objects.insert(key, (index, obj_id));
        }
    }

    fn build_font_resource_dict(&self, font_objects: &BTreeMap<FontKey, (usize, usize)>) -> String {
        font_objects
            .values()
            .map(|(index, obj_id)| format!("/F{} {} 0 R", index, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

/// Collect the font keys of every text element.
fn collect_font_keys(elements: &[LayoutElement], keys: &mut Vec<FontKey>) {
    for element in elements {
        if let DrawCommand::Text { font, .. } = &element.draw {
            keys.push(FontKey::from_spec(font));
        }
        collect_font_keys(&element.children, keys);
    }
}

fn rgb(color: &Color) -> String {
    format!("{:.3} {:.3} {:.3}", color.r, color.g, color.b)
}

/// Write `text` as a WinAnsi-encoded PDF literal string, parentheses
/// included. Characters outside WinAnsi become `?`.
fn write_pdf_string(out: &mut Vec<u8>, text: &str) {
    out.push(b'(');
    for ch in text.chars() {
        match ch {
            '\\' => out.extend_from_slice(b"\\\\"),
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(unicode_to_winansi(ch).unwrap_or(b'?')),
        }
    }
    out.push(b')');
}

/// Map a Unicode character to its Windows-1252 byte.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // €
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85), // …
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}
