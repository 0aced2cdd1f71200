//! Process-wide configuration
//!
//! Read once from the environment at startup and shared read-only by all
//! extraction invocations. Nothing here is mutated after init.

const MB: u64 = 1024 * 1024;

/// Default upload ceiling when `MAX_FILE_SIZE_MB` is unset
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;

/// Default OCR engine command when `TESSERACT_CMD` is unset
pub const DEFAULT_OCR_COMMAND: &str = "tesseract";

/// Immutable service settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum accepted upload size in bytes
    pub max_file_size_bytes: u64,
    /// OCR engine binary path or name resolved via PATH
    pub ocr_command: String,
}

impl Config {
    /// Read settings from the environment.
    ///
    /// Recognized variables: `TESSERACT_CMD` and `MAX_FILE_SIZE_MB`.
    /// A malformed `MAX_FILE_SIZE_MB` falls back to the default with a warning.
    pub fn from_env() -> Self {
        let max_mb = match std::env::var("MAX_FILE_SIZE_MB") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(mb) if mb > 0 => mb,
                _ => {
                    tracing::warn!(
                        value = raw,
                        default = DEFAULT_MAX_FILE_SIZE_MB,
                        "invalid MAX_FILE_SIZE_MB, using default"
                    );
                    DEFAULT_MAX_FILE_SIZE_MB
                }
            },
            Err(_) => DEFAULT_MAX_FILE_SIZE_MB,
        };

        let ocr_command = std::env::var("TESSERACT_CMD")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OCR_COMMAND.to_string());

        Self {
            max_file_size_bytes: max_mb * MB,
            ocr_command,
        }
    }

    /// Configured limit in whole megabytes, as reported by `/config`
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_bytes / MB
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * MB,
            ocr_command: DEFAULT_OCR_COMMAND.to_string(),
        }
    }
}
