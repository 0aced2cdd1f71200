//! Document Text Extraction Service - Entry point

use doc_extract_server::{run_server, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_extract_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    tracing::info!(
        max_file_size_mb = config.max_file_size_mb(),
        ocr_command = %config.ocr_command,
        "Starting Document Text Extraction Service"
    );

    run_server(config).await
}
