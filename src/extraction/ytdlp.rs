//! yt-dlp backed extractor

use super::options::ExtractionOptions;
use super::{AudioExtractor, DownloadReport, Enumeration, ExtractorCapabilities, output_tail};
use crate::config::ToolsConfig;
use crate::error::ExtractionError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Extractor that runs the external `yt-dlp` binary
///
/// Transcoding to mp3 is delegated to yt-dlp, which in turn needs `ffmpeg`.
/// When an ffmpeg path is known it is passed along with `--ffmpeg-location`.
///
/// # Examples
///
/// ```no_run
/// use audio_dl::extraction::{AudioExtractor, YtDlpExtractor};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Create with explicit path
/// let extractor = YtDlpExtractor::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let extractor = YtDlpExtractor::from_path()
///     .expect("yt-dlp not found in PATH");
///
/// let listing = extractor.enumerate("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
/// assert_eq!(listing.count, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
}

impl YtDlpExtractor {
    /// Create an extractor with an explicit yt-dlp path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            ffmpeg_path: None,
        }
    }

    /// Pass an explicit ffmpeg location to yt-dlp
    pub fn with_ffmpeg(mut self, ffmpeg_path: PathBuf) -> Self {
        self.ffmpeg_path = Some(ffmpeg_path);
        self
    }

    /// Attempt to find yt-dlp (and ffmpeg) in PATH
    ///
    /// Returns `None` if yt-dlp is not found. A missing ffmpeg is not fatal:
    /// fast mode works without it.
    pub fn from_path() -> Option<Self> {
        let extractor = which::which("yt-dlp").ok().map(Self::new)?;
        Some(match which::which("ffmpeg") {
            Ok(ffmpeg) => extractor.with_ffmpeg(ffmpeg),
            Err(_) => extractor,
        })
    }

    /// Resolve binaries from configuration, falling back to PATH when allowed
    pub fn from_config(tools: &ToolsConfig) -> Option<Self> {
        let binary = tools
            .yt_dlp_path
            .clone()
            .or_else(|| tools.search_path.then(|| which::which("yt-dlp").ok()).flatten())?;
        let ffmpeg = tools
            .ffmpeg_path
            .clone()
            .or_else(|| tools.search_path.then(|| which::which("ffmpeg").ok()).flatten());

        let extractor = Self::new(binary);
        Some(match ffmpeg {
            Some(path) => extractor.with_ffmpeg(path),
            None => extractor,
        })
    }

    /// Path of the yt-dlp binary in use
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ffmpeg) = &self.ffmpeg_path {
            command.arg("--ffmpeg-location").arg(ffmpeg);
        }
        command
    }
}

/// The slice of yt-dlp's `--dump-single-json` output we care about
#[derive(Debug, Deserialize)]
struct MetadataDump {
    #[serde(default)]
    title: Option<String>,
    /// Present for playlists and channels, absent for a single video
    #[serde(default)]
    entries: Option<Vec<serde_json::Value>>,
}

/// Parse the metadata dump into an [`Enumeration`]
pub(crate) fn parse_enumeration(url: &str, stdout: &[u8]) -> crate::Result<Enumeration> {
    let dump: MetadataDump =
        serde_json::from_slice(stdout).map_err(|e| ExtractionError::EnumerationFailed {
            url: url.to_string(),
            reason: format!("unreadable metadata: {}", e),
        })?;

    Ok(Enumeration {
        count: dump.entries.map_or(1, |entries| entries.len()),
        title: dump.title,
    })
}

#[async_trait]
impl AudioExtractor for YtDlpExtractor {
    async fn enumerate(&self, url: &str) -> crate::Result<Enumeration> {
        let output = self
            .command()
            .args(ExtractionOptions::enumerate_args(url))
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        // With --ignore-errors a playlist with dead entries still prints its
        // metadata and exits non-zero, so stdout decides.
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            let reason = output_tail(&output.stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(ExtractionError::EnumerationFailed {
                url: url.to_string(),
                reason,
            }
            .into());
        }

        let enumeration = parse_enumeration(url, &output.stdout)?;
        debug!(
            url,
            count = enumeration.count,
            title = enumeration.title.as_deref().unwrap_or(""),
            "enumerated source"
        );
        Ok(enumeration)
    }

    async fn download(
        &self,
        url: &str,
        workspace: &Path,
        options: &ExtractionOptions,
    ) -> crate::Result<DownloadReport> {
        let output = self
            .command()
            .args(options.download_args(workspace, url))
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if output.status.success() {
            return Ok(DownloadReport::ok());
        }

        let stderr_tail = output_tail(&output.stderr);
        warn!(
            url,
            status = %output.status,
            stderr = stderr_tail.as_deref().unwrap_or(""),
            "yt-dlp reported failures during download"
        );
        Ok(DownloadReport {
            success: false,
            stderr_tail,
        })
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities {
            can_extract: true,
            // yt-dlp may still find ffmpeg on its own PATH lookup
            can_transcode: self.ffmpeg_path.is_some(),
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
