//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a PDF 1.7
//! file byte by byte. Reports only use the standard Helvetica faces, so
//! fonts are plain Type1 references with WinAnsi encoding and nothing is
//! embedded except images.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages, streams
//! 2 0 obj ... endobj
//! ...
//! xref                <- byte offset of each object
//! trailer             <- points to the catalog and the info dictionary
//! %%EOF
//! ```
//!
//! Layout coordinates have their origin at the top-left; PDF user space
//! starts at the bottom-left, so every y is flipped against the page height.

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use chrono::{DateTime, Utc};
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::ReportError;
use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, Stroke};

const PRODUCER: &str = concat!("medreport ", env!("CARGO_PKG_VERSION"));

/// Document-level metadata written to the Info dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    /// Index 0 is the unused free-list head; ids are 1-based.
    objects: Vec<Vec<u8>>,
    /// Fonts in resource order: `/F0`, `/F1`, ...
    fonts: Vec<(StandardFont, usize)>,
    /// Image XObject ids per page, in drawing order: `/Im0`, `/Im1`, ...
    page_images: Vec<Vec<usize>>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn font_index(&self, font: StandardFont) -> usize {
        self.fonts
            .iter()
            .position(|(f, _)| *f == font)
            .unwrap_or(0)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize laid-out pages into a complete PDF document.
    pub fn write(&self, pages: &[LayoutPage], info: &DocumentInfo) -> Result<Vec<u8>, ReportError> {
        if pages.is_empty() {
            return Err(ReportError::Render("document has no pages".to_string()));
        }

        // 1 = Catalog, 2 = Pages; filled in once the page ids are known
        let mut builder = PdfBuilder {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            fonts: Vec::new(),
            page_images: Vec::new(),
        };

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages);

        let mut page_ids = Vec::with_capacity(pages.len());
        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.content_stream(page, &builder);
            let content_id = builder.push(flate_stream("", content.as_bytes()));

            let fonts = builder
                .fonts
                .iter()
                .enumerate()
                .map(|(i, (_, id))| format!("/F{} {} 0 R", i, id))
                .collect::<Vec<_>>()
                .join(" ");
            let images = builder.page_images[page_idx]
                .iter()
                .enumerate()
                .map(|(i, id)| format!("/Im{} {} 0 R", i, id))
                .collect::<Vec<_>>()
                .join(" ");
            let resources = if images.is_empty() {
                format!("/Font << {} >>", fonts)
            } else {
                format!("/Font << {} >> /XObject << {} >>", fonts, images)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_id, resources
            );
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] =
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_ids.len()).into_bytes();

        let info_id = builder.push(self.info_dict(info).into_bytes());
        Ok(self.serialize(&builder, info_id))
    }

    /// Every standard font used anywhere in the document, in a fixed order.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut used: BTreeSet<StandardFont> = pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { style, .. } => Some(style.font),
                _ => None,
            })
            .collect();
        if used.is_empty() {
            used.insert(StandardFont::Helvetica);
        }
        for font in used {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.fonts.push((font, id));
        }
    }

    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for page in pages {
            let mut ids = Vec::new();
            for el in &page.elements {
                if let DrawCommand::Image { image_data } = &el.draw {
                    ids.push(write_image_xobject(builder, image_data));
                }
            }
            builder.page_images.push(ids);
        }
    }

    /// The uncompressed content stream for one page.
    fn content_stream(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        let mut image_counter = 0usize;
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, builder, &mut image_counter);
        }
        stream
    }

    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        image_counter: &mut usize,
    ) {
        match &element.draw {
            DrawCommand::Text { lines, style } => {
                let font = builder.font_index(style.font);
                let c = style.color;
                let _ = write!(stream, "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n", c.r, c.g, c.b, font, style.size);
                for line in lines {
                    let _ = write!(
                        stream,
                        "1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\n",
                        line.x,
                        page_height - line.y,
                        encode_text(&line.text)
                    );
                }
                stream.push_str("ET\n");
            }

            DrawCommand::Line { x1, y1, x2, y2, stroke } => {
                write_stroke(stream, stroke);
                let _ = write!(
                    stream,
                    "{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    x1,
                    page_height - y1,
                    x2,
                    page_height - y2
                );
            }

            DrawCommand::Rect { background, border, radius } => {
                let x = element.x;
                let y = page_height - element.y - element.height;
                let (w, h) = (element.width, element.height);

                if let Some(bg) = background.filter(|bg| bg.a > 0.0) {
                    let _ = write!(stream, "q\n{:.3} {:.3} {:.3} rg\n", bg.r, bg.g, bg.b);
                    write_rect_path(stream, x, y, w, h, *radius);
                    stream.push_str("f\nQ\n");
                }
                if let Some(border) = border.filter(|b| b.width > 0.0) {
                    write_stroke(stream, &border);
                    write_rect_path(stream, x, y, w, h, *radius);
                    stream.push_str("S\nQ\n");
                }
            }

            DrawCommand::Image { .. } => {
                let idx = *image_counter;
                *image_counter += 1;
                let y = page_height - element.y - element.height;
                let _ = write!(
                    stream,
                    "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    element.width, element.height, element.x, y, idx
                );
            }
        }
    }

    fn info_dict(&self, info: &DocumentInfo) -> String {
        let mut dict = String::from("<< ");
        let fields = [
            ("Title", &info.title),
            ("Author", &info.author),
            ("Subject", &info.subject),
            ("Creator", &info.creator),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = write!(dict, "/{} ({}) ", key, encode_text(value));
            }
        }
        if let Some(date) = info.creation_date {
            let _ = write!(dict, "/CreationDate (D:{}Z) ", date.format("%Y%m%d%H%M%S"));
        }
        let _ = write!(dict, "/Producer ({}) >>", PRODUCER);
        dict
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_id: usize) -> Vec<u8> {
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
            info_id,
            xref_offset
        );
        output
    }
}

/// Open a graphics state with the given stroke. The caller closes it.
fn write_stroke(stream: &mut String, stroke: &Stroke) {
    let c = stroke.color;
    let _ = write!(
        stream,
        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n",
        c.r, c.g, c.b, stroke.width
    );
}

/// A rectangle path in PDF space, with Bézier corners when `r > 0`.
fn write_rect_path(stream: &mut String, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    if r <= 0.0 {
        let _ = write!(stream, "{:.2} {:.2} {:.2} {:.2} re\n", x, y, w, h);
        return;
    }
    // Control point distance for a quarter circle
    let k = 0.5522847498 * r;
    let _ = write!(stream, "{:.2} {:.2} m\n", x + r, y);
    let _ = write!(stream, "{:.2} {:.2} l\n", x + w - r, y);
    let _ = write!(
        stream,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
        x + w - r + k, y, x + w, y + r - k, x + w, y + r
    );
    let _ = write!(stream, "{:.2} {:.2} l\n", x + w, y + h - r);
    let _ = write!(
        stream,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
        x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h
    );
    let _ = write!(stream, "{:.2} {:.2} l\n", x + r, y + h);
    let _ = write!(
        stream,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
        x + r - k, y + h, x, y + h - r + k, x, y + h - r
    );
    let _ = write!(stream, "{:.2} {:.2} l\n", x, y + r);
    let _ = write!(
        stream,
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
        x, y + r - k, x + r - k, y, x + r, y
    );
    stream.push_str("h\n");
}

/// `<< dict-extras /Length n /Filter /FlateDecode >> stream ... endstream`
fn flate_stream(extra: &str, data: &[u8]) -> Vec<u8> {
    let compressed = compress_to_vec_zlib(data, 6);
    let mut out: Vec<u8> = Vec::new();
    let _ = write!(
        out,
        "<< {}/Length {} /Filter /FlateDecode >>\nstream\n",
        extra,
        compressed.len()
    );
    out.extend_from_slice(&compressed);
    out.extend_from_slice(b"\nendstream");
    out
}

/// Write an image as one XObject, plus an SMask when it has alpha.
fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
    let (w, h) = (image.width_px, image.height_px);
    match &image.pixel_data {
        ImagePixelData::Jpeg { data, color_space } => {
            let cs = match color_space {
                JpegColorSpace::DeviceRGB => "/DeviceRGB",
                JpegColorSpace::DeviceGray => "/DeviceGray",
            };
            let mut obj: Vec<u8> = Vec::new();
            let _ = write!(
                obj,
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} \
                 /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                w,
                h,
                cs,
                data.len()
            );
            obj.extend_from_slice(data);
            obj.extend_from_slice(b"\nendstream");
            builder.push(obj)
        }
        ImagePixelData::Decoded { rgb, alpha } => {
            let smask = alpha.as_ref().map(|alpha| {
                let extra = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceGray /BitsPerComponent 8 ",
                    w, h
                );
                builder.push(flate_stream(&extra, alpha))
            });
            let smask_ref = smask
                .map(|id| format!("/SMask {} 0 R ", id))
                .unwrap_or_default();
            let extra = format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 {}",
                w, h, smask_ref
            );
            builder.push(flate_stream(&extra, rgb))
        }
    }
}

/// Encode text for a PDF literal string in WinAnsi, escaping delimiters.
fn encode_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let b = unicode_to_winansi(ch).unwrap_or(b'?');
        match b {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is Windows-1252: Latin-1 maps directly and the
/// 0x80..=0x9F range holds quotes, dashes and a few letters.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
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
