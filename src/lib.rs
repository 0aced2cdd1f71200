//! Document Text Extraction Service Library
//!
//! This crate extracts plain text from uploaded documents:
//! - PDF: native text layer with per-page OCR fallback for scanned pages
//! - Raster images: OCR via the configured Tesseract binary
//! - Office containers: DOCX, XLSX and PPTX structural readers

pub mod config;
pub mod error;
pub mod extract;
pub mod ocr;
pub mod server;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use extract::{
    extract, file_extension, needs_ocr, validate, ExtractionResult, SourceFormat, UploadedFile,
    SUPPORTED_EXTENSIONS,
};
pub use ocr::OcrEngine;
pub use server::{router, run_server};
