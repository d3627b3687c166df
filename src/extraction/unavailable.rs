//! Extractor used when yt-dlp is not installed

use super::options::ExtractionOptions;
use super::{AudioExtractor, DownloadReport, Enumeration, ExtractorCapabilities};
use async_trait::async_trait;
use std::path::Path;

/// Extractor used when no yt-dlp binary is available or configured
///
/// Every call returns `Error::NotSupported`, so the server still starts and
/// each job ends with a `FAILED:` marker.
///
/// # Examples
///
/// ```
/// use audio_dl::extraction::{AudioExtractor, UnavailableExtractor};
///
/// # #[tokio::main]
/// # async fn main() {
/// let extractor = UnavailableExtractor;
/// assert!(extractor.enumerate("https://example.com/v").await.is_err());
/// assert!(!extractor.capabilities().can_extract);
/// # }
/// ```
pub struct UnavailableExtractor;

const UNAVAILABLE_MESSAGE: &str = "Audio extraction requires the external yt-dlp binary. \
     Set YT_DLP_PATH or ensure yt-dlp is in PATH.";

#[async_trait]
impl AudioExtractor for UnavailableExtractor {
    async fn enumerate(&self, _url: &str) -> crate::Result<Enumeration> {
        Err(crate::Error::NotSupported(UNAVAILABLE_MESSAGE.into()))
    }

    async fn download(
        &self,
        _url: &str,
        _workspace: &Path,
        _options: &ExtractionOptions,
    ) -> crate::Result<DownloadReport> {
        Err(crate::Error::NotSupported(UNAVAILABLE_MESSAGE.into()))
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities {
            can_extract: false,
            can_transcode: false,
        }
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
