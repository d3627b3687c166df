//! # audio-dl
//!
//! Streaming audio download service built around yt-dlp.
//!
//! ## How it works
//!
//! - A client posts a URL and a mode; the response body is a live progress
//!   stream, one line per step, ending in exactly one marker line
//!   (`SINGLE_FILE:<token>:<filename>`, `ALL_DONE:<token>` or `FAILED:<token>`)
//! - yt-dlp runs in either **fast** mode (native m4a, no transcoding) or
//!   **compatible** mode (mp3 at 128 kbps through ffmpeg)
//! - One downloaded item is delivered as-is; anything more is zipped
//! - Each result can be fetched exactly once, after which its files are removed
//!
//! ## Quick Start
//!
//! ```no_run
//! use audio_dl::{AudioDownloader, AudioFormat, Config};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = AudioDownloader::new(Config::default()).await?;
//!
//!     let mut job = downloader
//!         .submit("https://www.youtube.com/watch?v=dQw4w9WgXcQ", AudioFormat::Fast)
//!         .await?;
//!     while let Some(line) = job.lines.next().await {
//!         print!("{line}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Job orchestration: pipeline, registry, retrieval and lifecycle
pub mod downloader;
/// Error types
pub mod error;
/// yt-dlp integration
pub mod extraction;
/// Single-file or zip packaging of a job's output
pub mod packaging;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Per-job scratch directories and archives
pub mod workspace;

// Re-export commonly used types
pub use config::Config;
pub use downloader::{AudioDownloader, Delivery, JobStream};
pub use error::{
    ApiError, Error, ErrorDetail, ExtractionError, PackagingError, Result, ToHttpStatus,
};
pub use extraction::{AudioExtractor, YtDlpExtractor};
pub use types::{
    AudioFormat, Capabilities, JobId, JobInfo, JobState, JobSummary, ProgressMarker,
};
pub use workspace::{FsWorkspaceStore, WorkspaceStore};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use audio_dl::{AudioDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = AudioDownloader::new(Config::default()).await?;
///     let _sweeper = downloader.start_sweeper();
///
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: AudioDownloader) -> Result<()> {
    shutdown_signal().await;
    downloader.shutdown().await
}

/// Resolve once the process receives a termination signal
///
/// Suitable as the graceful-shutdown future of
/// [`api::start_api_server_with_shutdown`].
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

/// Resolve once the process receives Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
