//! PDF extraction: native text layer with per-page OCR fallback
//!
//! Each page is first read through its embedded text layer. Pages that
//! yield nothing usable (scanned pages, pure images) are rasterized and
//! handed to the OCR engine. Output preserves page order with a single
//! newline between pages.

use image::ImageFormat;
use pdfium_render::prelude::*;

use crate::error::{Error, Result};
use crate::ocr::OcrEngine;

/// Rasterization resolution for OCR fallback pages
const RENDER_DPI: f32 = 300.0;

/// Same-line grouping tolerance for text layer characters, in points
const Y_TOLERANCE: f32 = 5.0;

/// Horizontal gap treated as a word boundary, in points
const SPACE_THRESHOLD: f32 = 10.0;

/// Get a PDFium instance (a new one per call - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::EngineUnavailable {
            reason: format!("failed to initialize PDFium: {e}"),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Decide whether a page's native text layer is usable or the page must
/// go through OCR. Pure predicate so the fallback decision is testable
/// without an engine.
pub fn needs_ocr(native_text: &str) -> bool {
    native_text.trim().is_empty()
}

/// Extract text from a PDF buffer.
///
/// Fails fast with `CorruptInput` when the container cannot be opened and
/// with `EngineUnavailable` the first time the OCR binary cannot be
/// invoked. A single page's OCR failure contributes an empty segment;
/// only OCR failing on every page escalates to `OcrFailure`.
pub fn extract_text(data: &[u8], engine: &OcrEngine) -> Result<String> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::corrupt("not a PDF file"));
    }

    let pdfium = create_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| Error::corrupt(format!("failed to open PDF: {e}")))?;

    let pages = document.pages();
    let page_len = pages.len();
    let mut segments: Vec<String> = Vec::with_capacity(page_len as usize);
    let mut ocr_pages = 0usize;
    let mut ocr_failures = 0usize;

    for index in 0..page_len {
        let page = pages.get(index).map_err(|e| {
            Error::corrupt(format!("failed to read page {}: {e}", index + 1))
        })?;

        let native = native_page_text(&page);
        if !needs_ocr(&native) {
            segments.push(native);
            continue;
        }

        ocr_pages += 1;
        match ocr_page(&page, engine) {
            Ok(text) => segments.push(text),
            Err(err @ Error::EngineUnavailable { .. }) => {
                // A missing binary will not come back on the next page
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(page = index + 1, %err, "page OCR failed, skipping page");
                ocr_failures += 1;
                segments.push(String::new());
            }
        }
    }

    if page_len > 0 && ocr_failures == page_len as usize {
        return Err(Error::OcrFailure {
            reason: format!("OCR failed on all {page_len} pages"),
        });
    }

    tracing::debug!(
        pages = page_len,
        ocr_pages,
        ocr_failures,
        "PDF extraction finished"
    );

    Ok(segments.join("\n").trim().to_string())
}

/// Read a page's text layer in visual order.
///
/// Characters are collected with their positions, grouped into lines by
/// Y proximity, ordered left to right, and separated by spaces where the
/// horizontal gap exceeds a word boundary.
fn native_page_text(page: &PdfPage) -> String {
    let text_obj = match page.text() {
        Ok(t) => t,
        Err(_) => return String::new(),
    };

    let mut chars: Vec<(char, f32, f32)> = Vec::new();
    for segment in text_obj.segments().iter() {
        if let Ok(segment_chars) = segment.chars() {
            for ch in segment_chars.iter() {
                if let (Some(c), Ok(bounds)) = (ch.unicode_char(), ch.loose_bounds()) {
                    chars.push((c, bounds.left().value, bounds.top().value));
                }
            }
        }
    }

    if chars.is_empty() {
        return String::new();
    }

    // Top to bottom, then left to right
    chars.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<(char, f32)>> = Vec::new();
    let mut current_line: Vec<(char, f32)> = Vec::new();
    let mut current_y: Option<f32> = None;
    for (c, x, y) in chars {
        match current_y {
            Some(cur_y) if (cur_y - y).abs() <= Y_TOLERANCE => current_line.push((c, x)),
            _ => {
                if !current_line.is_empty() {
                    lines.push(std::mem::take(&mut current_line));
                }
                current_line.push((c, x));
                current_y = Some(y);
            }
        }
    }
    if !current_line.is_empty() {
        lines.push(current_line);
    }

    let mut result = String::new();
    for mut line in lines {
        line.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let mut prev_x: Option<f32> = None;
        for (c, x) in line {
            if let Some(px) = prev_x {
                if x - px > SPACE_THRESHOLD && c != ' ' {
                    result.push(' ');
                }
            }
            result.push(c);
            prev_x = Some(x);
        }
        result.push('\n');
    }

    result.trim_end().to_string()
}

/// Rasterize one page and run it through the OCR engine.
fn ocr_page(page: &PdfPage, engine: &OcrEngine) -> Result<String> {
    let scale = RENDER_DPI / 72.0;
    let width = (page.width().value * scale) as i32;
    let height = (page.height().value * scale) as i32;

    let bitmap = page
        .render_with_config(
            &PdfRenderConfig::new()
                .set_target_width(width)
                .set_target_height(height),
        )
        .map_err(|e| Error::OcrFailure {
            reason: format!("failed to rasterize page: {e}"),
        })?;

    let mut png = Vec::new();
    bitmap
        .as_image()
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| Error::OcrFailure {
            reason: format!("failed to encode page image: {e}"),
        })?;

    engine.recognize_png(&png)
}
