//! Raster image extraction via OCR
//!
//! Decodes the uploaded buffer (any of the supported raster codecs) and
//! hands the engine a single normalized PNG, so GIF and WebP uploads work
//! regardless of which codecs the engine build understands.

use image::ImageFormat;

use crate::error::{Error, Result};
use crate::ocr::OcrEngine;

/// Run OCR over a raster image buffer.
///
/// An undecodable buffer is `CorruptInput`. A successful engine run that
/// recognizes no text returns an empty string, which is not an error.
pub fn extract_text(data: &[u8], engine: &OcrEngine) -> Result<String> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| Error::corrupt(format!("failed to decode image: {e}")))?;

    let mut png = Vec::new();
    decoded
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| Error::corrupt(format!("failed to re-encode image: {e}")))?;

    engine.recognize_png(&png)
}
