//! OCR engine invocation
//!
//! Wraps the configured Tesseract binary behind a narrow interface: PNG
//! bytes in, recognized text out. The engine is an external process; its
//! input file lives in a scoped temp file that is unlinked on every exit
//! path, so no handles or subprocesses outlive a call.

use std::io::Write;
use std::process::Command;

use crate::error::{Error, Result};

/// Handle to the external OCR engine.
///
/// Holds only the configured command; each recognition spawns a fresh
/// process and waits for it, so concurrent callers never share state.
#[derive(Debug, Clone)]
pub struct OcrEngine {
    command: String,
}

impl OcrEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Probe whether the engine binary responds to `--version`.
    ///
    /// Used for the startup log only; extraction calls report
    /// `EngineUnavailable` themselves when the spawn fails.
    pub fn available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Run the engine over a PNG image and return the recognized text.
    ///
    /// A successful run that recognizes nothing returns an empty string;
    /// that is not an error.
    pub fn recognize_png(&self, png: &[u8]) -> Result<String> {
        let mut input = tempfile::Builder::new()
            .prefix("doc-extract-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| Error::OcrFailure {
                reason: format!("failed to stage OCR input: {e}"),
            })?;
        input.write_all(png).map_err(|e| Error::OcrFailure {
            reason: format!("failed to stage OCR input: {e}"),
        })?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg("eng")
            .output()
            .map_err(|e| Error::EngineUnavailable {
                reason: format!("failed to invoke {:?}: {e}", self.command),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::OcrFailure {
                reason: format!(
                    "{:?} exited with {}: {}",
                    self.command,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        // Tesseract emits a form feed per page of output
        let text = String::from_utf8_lossy(&output.stdout).replace('\x0c', "");
        Ok(text.trim().to_string())
    }
}
