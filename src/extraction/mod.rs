//! Media extraction via an external tool
//!
//! The core abstraction is the [`AudioExtractor`] trait. Two implementations are
//! provided:
//!
//! - [`YtDlpExtractor`]: runs the external `yt-dlp` binary (and, through it, `ffmpeg`)
//! - [`UnavailableExtractor`]: stand-in when no binary could be found; every job
//!   fails cleanly with a `FAILED:` marker instead of crashing the server
//!
//! Extraction is two passes. [`AudioExtractor::enumerate`] resolves the URL's
//! metadata without fetching media to learn how many items it names;
//! [`AudioExtractor::download`] then writes the audio files into the job workspace.
//!
//! ## Usage
//!
//! ```no_run
//! use audio_dl::extraction::{AudioExtractor, ExtractionOptions, YtDlpExtractor};
//! use audio_dl::AudioFormat;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = YtDlpExtractor::from_path().expect("yt-dlp not found in PATH");
//!
//!     let listing = extractor.enumerate("https://example.com/playlist").await?;
//!     println!("{} item(s)", listing.count);
//!
//!     let options = ExtractionOptions::from(AudioFormat::Compatible);
//!     let report = extractor
//!         .download("https://example.com/playlist", Path::new("temp/job"), &options)
//!         .await?;
//!     if !report.success {
//!         println!("partial failure: {:?}", report.stderr_tail);
//!     }
//!     Ok(())
//! }
//! ```

mod options;
mod unavailable;
mod ytdlp;

pub use options::{ExtractionOptions, Transcode};
pub use unavailable::UnavailableExtractor;
pub use ytdlp::YtDlpExtractor;

use async_trait::async_trait;
use std::path::Path;

/// Result of the metadata-only pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    /// Number of items the URL resolved to (1 for a single video)
    ///
    /// Playlist entries that turned out to be unavailable are still counted.
    pub count: usize,
    /// Title of the video or playlist, when reported
    pub title: Option<String>,
}

/// Result of the download pass
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Whether every item downloaded without error
    pub success: bool,
    /// Last diagnostic line from the tool, when some items failed
    pub stderr_tail: Option<String>,
}

impl DownloadReport {
    /// A report for a pass where nothing went wrong
    pub fn ok() -> Self {
        Self {
            success: true,
            stderr_tail: None,
        }
    }
}

/// What an extractor implementation can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorCapabilities {
    /// Can enumerate and download at all
    pub can_extract: bool,
    /// Can transcode to mp3 (ffmpeg available)
    pub can_transcode: bool,
}

/// Trait for the external extraction tool
///
/// Implementations must tolerate per-item failures inside a multi-item source:
/// the download pass keeps going and reports the failure in [`DownloadReport`]
/// rather than returning `Err`. `Err` is reserved for the case where the tool
/// could not run or produced nothing usable at all.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Resolve `url` to an item count without downloading media
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be executed or the URL cannot be resolved.
    async fn enumerate(&self, url: &str) -> crate::Result<Enumeration>;

    /// Download every item of `url` into `workspace`
    ///
    /// # Errors
    ///
    /// Returns an error only if the tool could not be run at all.
    async fn download(
        &self,
        url: &str,
        workspace: &Path,
        options: &ExtractionOptions,
    ) -> crate::Result<DownloadReport>;

    /// Query capabilities of this extractor
    fn capabilities(&self) -> ExtractorCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Last non-empty line of tool output, trimmed and capped at 300 chars
pub(crate) fn output_tail(output: &[u8]) -> Option<String> {
    const MAX_TAIL_CHARS: usize = 300;

    let text = String::from_utf8_lossy(output);
    let line = text.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.chars().take(MAX_TAIL_CHARS).collect())
}

/// Whether `name` is a leftover of an interrupted yt-dlp download
///
/// Covers `.part` files, their fragments, `.ytdl` resume state and
/// `.temp.<ext>` intermediates written during post-processing.
pub fn is_incomplete_download(name: &str) -> bool {
    name.ends_with(".part")
        || name.ends_with(".ytdl")
        || name.contains(".part-Frag")
        || name.contains(".temp.")
}
