//! Extraction pipeline
//!
//! The core of the service: a validation gate, a closed format dispatch,
//! and one extractor per format family. An invocation owns its
//! [`UploadedFile`], shares nothing mutable, and produces exactly one of
//! [`ExtractionResult`] or [`crate::error::Error`].

mod image;
mod office;
mod pdf;

pub use pdf::needs_ocr;

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ocr::OcrEngine;

/// Extensions the validation gate accepts, dotted and lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".docx", ".xlsx", ".pptx",
];

/// One uploaded document: declared metadata plus the raw buffer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// Size the transport layer declared for the upload
    pub declared_size: u64,
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Build an upload whose declared size matches the buffer.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            declared_size: content.len() as u64,
            content,
        }
    }
}

/// Closed set of formats the pipeline knows how to extract.
///
/// Extension strings are parsed into this tag exactly once; all later
/// dispatch is a checked `match`, so adding a format is a compile-time
/// change rather than a scattered string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Image,
    Docx,
    Xlsx,
    Pptx,
}

impl SourceFormat {
    /// Map a dotted lowercase extension to its format tag.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".pdf" => Some(Self::Pdf),
            ".jpg" | ".jpeg" | ".png" | ".gif" | ".webp" => Some(Self::Image),
            ".docx" => Some(Self::Docx),
            ".xlsx" => Some(Self::Xlsx),
            ".pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
        }
    }
}

/// Successful outcome of one extraction invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    pub source_format: SourceFormat,
}

/// Dotted lowercase extension of a filename, `""` when there is none.
///
/// The extension is taken from the declared filename only, never from a
/// content-type header.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Validation gate: extension membership, then size ceiling.
///
/// Pure decision function, short-circuiting on the first failure. Returns
/// the format tag so routing never re-parses the extension.
pub fn validate(file: &UploadedFile, config: &Config) -> Result<SourceFormat> {
    let extension = file_extension(&file.filename);
    let format = SourceFormat::from_extension(&extension).ok_or_else(|| {
        Error::UnsupportedFormat {
            extension,
            supported: SUPPORTED_EXTENSIONS.join(", "),
        }
    })?;

    let actual = file.content.len() as u64;
    if actual > config.max_file_size_bytes {
        return Err(Error::size_exceeded(actual, config.max_file_size_bytes));
    }

    Ok(format)
}

/// One end-to-end extraction invocation.
///
/// Blocking: PDF parsing, OCR subprocesses and archive inflation all run
/// inline. Callers on an async runtime must isolate this on a worker
/// thread (the HTTP layer uses `spawn_blocking`).
pub fn extract(file: &UploadedFile, config: &Config, engine: &OcrEngine) -> Result<ExtractionResult> {
    let format = validate(file, config)?;

    if file.declared_size != file.content.len() as u64 {
        return Err(Error::corrupt(format!(
            "declared size {} bytes does not match received {} bytes",
            file.declared_size,
            file.content.len()
        )));
    }

    let text = match format {
        SourceFormat::Pdf => pdf::extract_text(&file.content, engine)?,
        SourceFormat::Image => image::extract_text(&file.content, engine)?,
        SourceFormat::Docx => office::extract_docx(&file.content)?,
        SourceFormat::Xlsx => office::extract_xlsx(&file.content)?,
        SourceFormat::Pptx => office::extract_pptx(&file.content)?,
    };

    Ok(ExtractionResult {
        text,
        source_format: format,
    })
}
