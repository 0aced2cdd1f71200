//! HTTP surface for the extraction pipeline
//!
//! Thin transport layer: reads the multipart upload, gates the endpoint's
//! format family, and runs the blocking pipeline on a worker thread. All
//! classification lives in the pipeline; this module only maps its
//! outcome onto the wire contract.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{extract, file_extension, validate, SourceFormat, UploadedFile};
use crate::ocr::OcrEngine;

/// Shared per-process context: immutable config plus the engine handle.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    engine: OcrEngine,
}

/// Which formats an `/extract/*` endpoint accepts.
#[derive(Debug, Clone, Copy)]
enum EndpointFamily {
    Pdf,
    Image,
    Office,
}

impl EndpointFamily {
    fn accepts(self, format: SourceFormat) -> bool {
        match self {
            EndpointFamily::Pdf => format == SourceFormat::Pdf,
            EndpointFamily::Image => format == SourceFormat::Image,
            EndpointFamily::Office => matches!(
                format,
                SourceFormat::Docx | SourceFormat::Xlsx | SourceFormat::Pptx
            ),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            EndpointFamily::Pdf => ".pdf",
            EndpointFamily::Image => ".jpg, .jpeg, .png, .gif, .webp",
            EndpointFamily::Office => ".docx, .xlsx, .pptx",
        }
    }
}

#[derive(Debug, Serialize)]
struct ExtractResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct ConfigResponse {
    max_file_size_bytes: u64,
    max_file_size_mb: u64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Build the service router.
pub fn router(config: Arc<Config>) -> Router {
    let engine = OcrEngine::new(&config.ocr_command);
    // Multipart envelope overhead must not preempt the pipeline's own
    // SizeExceeded classification, so the framework cap sits well above it
    let body_limit = (config.max_file_size_bytes as usize).saturating_mul(2) + 1024 * 1024;

    Router::new()
        .route("/extract/pdf", post(extract_pdf))
        .route("/extract/image", post(extract_image))
        .route("/extract/office", post(extract_office))
        .route("/config", get(get_config))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState { config, engine })
}

/// Bind and serve until the process is stopped.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let engine = OcrEngine::new(&config.ocr_command);
    if !engine.available() {
        tracing::warn!(
            command = %config.ocr_command,
            "OCR engine did not respond to --version, OCR requests will fail"
        );
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(Arc::new(config))).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        max_file_size_bytes: state.config.max_file_size_bytes,
        max_file_size_mb: state.config.max_file_size_mb(),
    })
}

async fn extract_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>> {
    extract_for_family(state, multipart, EndpointFamily::Pdf).await
}

async fn extract_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>> {
    extract_for_family(state, multipart, EndpointFamily::Image).await
}

async fn extract_office(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>> {
    extract_for_family(state, multipart, EndpointFamily::Office).await
}

async fn extract_for_family(
    state: AppState,
    multipart: Multipart,
    family: EndpointFamily,
) -> Result<Json<ExtractResponse>> {
    let file = read_upload(multipart).await?;

    // Cheap pure checks run on the request task; they also gate the
    // endpoint family before any parsing starts
    let format = validate(&file, &state.config)?;
    if !family.accepts(format) {
        return Err(Error::UnsupportedFormat {
            extension: file_extension(&file.filename),
            supported: family.expected().to_string(),
        });
    }

    let started = Instant::now();
    let size = file.content.len();
    let config = Arc::clone(&state.config);
    let engine = state.engine.clone();

    // Extraction blocks (PDFium, OCR subprocesses, archive inflation);
    // keep it off the accept loop
    let result = tokio::task::spawn_blocking(move || extract(&file, &config, &engine))
        .await
        .map_err(|e| Error::OcrFailure {
            reason: format!("extraction task failed: {e}"),
        })??;

    tracing::info!(
        format = result.source_format.label(),
        bytes = size,
        chars = result.text.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "extraction succeeded"
    );

    Ok(Json(ExtractResponse { text: result.text }))
}

/// Pull the `file` field out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| Error::corrupt(format!("unreadable multipart body: {e}")))?;
        let Some(field) = field else {
            return Err(Error::corrupt("multipart body has no \"file\" field"));
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::corrupt(format!("failed to read upload: {e}")))?;
        return Ok(UploadedFile::new(filename, bytes.to_vec()));
    }
}
