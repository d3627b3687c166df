//! Core downloader implementation split into focused submodules.
//!
//! The `AudioDownloader` struct and its methods are organized by domain:
//! - [`registry`] - In-memory job table and its atomic transitions
//! - [`pipeline`] - Job submission and the progress-streaming worker
//! - [`retrieval`] - One-shot artifact delivery and cleanup on drop
//! - [`lifecycle`] - Construction, orphan sweeping and shutdown

mod lifecycle;
mod pipeline;
mod registry;
mod retrieval;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use pipeline::JobStream;
pub use retrieval::{ARCHIVE_DOWNLOAD_NAME, ArtifactStream, Delivery};

use crate::config::Config;
use crate::extraction::AudioExtractor;
use crate::workspace::WorkspaceStore;
use registry::JobRegistry;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct AudioDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: std::sync::Arc<Config>,
    /// Workspace storage (trait object so tests can instrument it)
    pub(crate) store: std::sync::Arc<dyn WorkspaceStore>,
    /// External extraction tool (trait object for pluggable implementations)
    pub(crate) extractor: std::sync::Arc<dyn AudioExtractor>,
    /// Live jobs keyed by token
    pub(crate) registry: JobRegistry,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: std::sync::Arc<std::sync::atomic::AtomicBool>,
    /// Cancels the orphan sweeper on shutdown
    pub(crate) sweeper_cancel: tokio_util::sync::CancellationToken,
}

impl std::fmt::Debug for AudioDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDownloader")
            .field("temp_dir", self.config.temp_dir())
            .field("extractor", &self.extractor.name())
            .field("jobs", &self.registry.len())
            .finish()
    }
}
