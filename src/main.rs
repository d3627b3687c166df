//! audio-dl server binary
//!
//! Reads configuration from the environment (and `.env` if present), starts the
//! orphan sweeper and serves the REST API until SIGTERM/SIGINT.
//!
//! ```bash
//! PORT=5000 RUST_LOG=audio_dl=debug audio-dl
//! ```

use audio_dl::api::start_api_server_with_shutdown;
use audio_dl::{AudioDownloader, Config, shutdown_signal};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    info!(
        address = %config.server.api.bind_address,
        temp_dir = %config.workspace.temp_dir.display(),
        "audio-dl starting"
    );

    let downloader = Arc::new(AudioDownloader::new(config.clone()).await?);
    let sweeper = downloader.start_sweeper();

    start_api_server_with_shutdown(downloader.clone(), Arc::new(config), shutdown_signal())
        .await?;

    downloader.shutdown().await?;
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "orphan sweeper ended abnormally");
    }

    info!("audio-dl stopped");
    Ok(())
}
