//! Closed option set passed to the extractor

use crate::types::AudioFormat;
use std::ffi::OsString;
use std::path::Path;

/// Format selector for the fast path: native m4a when the site has it
pub const FAST_FORMAT_SELECTOR: &str = "bestaudio[ext=m4a]/bestaudio/best";

/// Format selector for the transcoded path: anything, ffmpeg converts it
pub const COMPATIBLE_FORMAT_SELECTOR: &str = "bestaudio/best";

/// Fixed mp3 bitrate, chosen for predictable conversion time
pub const TRANSCODE_BITRATE_KBPS: u32 = 128;

/// Output file name template, relative to the workspace
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Post-download transcode step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transcode {
    /// Target codec passed to `--audio-format`
    pub codec: &'static str,
    /// Target bitrate in kbit/s
    pub bitrate_kbps: u32,
}

/// Extractor options
///
/// Only constructible from an [`AudioFormat`]; there is no free-form escape hatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOptions {
    format_selector: &'static str,
    transcode: Option<Transcode>,
}

impl From<AudioFormat> for ExtractionOptions {
    fn from(format: AudioFormat) -> Self {
        match format {
            AudioFormat::Fast => Self {
                format_selector: FAST_FORMAT_SELECTOR,
                transcode: None,
            },
            AudioFormat::Compatible => Self {
                format_selector: COMPATIBLE_FORMAT_SELECTOR,
                transcode: Some(Transcode {
                    codec: "mp3",
                    bitrate_kbps: TRANSCODE_BITRATE_KBPS,
                }),
            },
        }
    }
}

impl ExtractionOptions {
    /// The `-f` format selector
    pub fn format_selector(&self) -> &'static str {
        self.format_selector
    }

    /// The transcode step, if any
    pub fn transcode(&self) -> Option<Transcode> {
        self.transcode
    }

    /// yt-dlp arguments for the metadata-only pass
    ///
    /// `--flat-playlist` lists the top-level entries without resolving them, so a
    /// nested playlist counts as a single entry.
    pub fn enumerate_args(url: &str) -> Vec<OsString> {
        [
            "--dump-single-json",
            "--flat-playlist",
            "--ignore-errors",
            "--no-warnings",
            "--",
            url,
        ]
        .into_iter()
        .map(OsString::from)
        .collect()
    }

    /// yt-dlp arguments for the download pass
    pub fn download_args(&self, workspace: &Path, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--ignore-errors",
            "--yes-playlist",
            "--no-progress",
            "--quiet",
            "--no-warnings",
            "-f",
            self.format_selector,
            "-o",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(workspace.join(OUTPUT_TEMPLATE).into_os_string());

        if let Some(transcode) = self.transcode {
            args.push("--extract-audio".into());
            args.push("--audio-format".into());
            args.push(transcode.codec.into());
            args.push("--audio-quality".into());
            args.push(format!("{}K", transcode.bitrate_kbps).into());
        }

        // Everything after `--` is a URL, even if it starts with a dash
        args.push("--".into());
        args.push(url.into());
        args
    }
}
