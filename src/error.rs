//! Error taxonomy for the extraction pipeline

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for the extraction pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Classified failure conditions. Every call through the pipeline
/// produces either an `ExtractionResult` or exactly one of these.
#[derive(Error, Debug)]
pub enum Error {
    /// Extension not in the supported set
    #[error("unsupported file format {extension:?}, supported formats: {supported}")]
    UnsupportedFormat { extension: String, supported: String },

    /// Upload larger than the configured ceiling
    #[error("file size {actual_bytes} bytes ({actual_mb} MB) exceeds the configured limit of {limit_bytes} bytes ({limit_mb} MB)")]
    SizeExceeded {
        actual_bytes: u64,
        actual_mb: u64,
        limit_bytes: u64,
        limit_mb: u64,
    },

    /// Container failed to open/parse, or declared size mismatched the buffer
    #[error("corrupt input: {reason}")]
    CorruptInput { reason: String },

    /// OCR engine was invoked but returned an error on every page/image
    #[error("OCR failed: {reason}")]
    OcrFailure { reason: String },

    /// OCR engine binary missing or not invocable at all
    #[error("OCR engine unavailable: {reason}")]
    EngineUnavailable { reason: String },
}

/// Discriminant-only view of [`Error`], used for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedFormat,
    SizeExceeded,
    CorruptInput,
    OcrFailure,
    EngineUnavailable,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::SizeExceeded => "size_exceeded",
            ErrorKind::CorruptInput => "corrupt_input",
            ErrorKind::OcrFailure => "ocr_failure",
            ErrorKind::EngineUnavailable => "engine_unavailable",
        }
    }
}

impl Error {
    /// Build a `SizeExceeded` carrying both byte and whole-megabyte figures,
    /// so the detail names the numbers the caller configured and sent.
    pub fn size_exceeded(actual_bytes: u64, limit_bytes: u64) -> Self {
        const MB: u64 = 1024 * 1024;
        Error::SizeExceeded {
            actual_bytes,
            actual_mb: actual_bytes.div_ceil(MB),
            limit_bytes,
            limit_mb: limit_bytes / MB,
        }
    }

    pub fn corrupt(reason: impl Into<String>) -> Self {
        Error::CorruptInput {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Error::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            Error::CorruptInput { .. } => ErrorKind::CorruptInput,
            Error::OcrFailure { .. } => ErrorKind::OcrFailure,
            Error::EngineUnavailable { .. } => ErrorKind::EngineUnavailable,
        }
    }

    /// HTTP status the wire contract assigns to this kind.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::UnsupportedFormat | ErrorKind::CorruptInput => StatusCode::BAD_REQUEST,
            ErrorKind::SizeExceeded => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::OcrFailure | ErrorKind::EngineUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Wire error body: `{"detail": "..."}`
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();
        if status.is_server_error() {
            tracing::error!(kind = self.kind().as_str(), detail, "extraction failed");
        } else {
            tracing::debug!(kind = self.kind().as_str(), detail, "request rejected");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}
