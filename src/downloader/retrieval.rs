//! One-shot artifact delivery.
//!
//! A retrieval claims the job in the registry, opens the artifact and hands out
//! an [`ArtifactStream`]. Whatever happens to that stream afterwards (fully
//! read, failed, or dropped by a disconnecting client), dropping it schedules
//! the purge of the job's storage.

use crate::error::{Error, Result};
use crate::types::{Artifact, JobId, JobState};
use crate::utils::content_type_for;
use axum::body::Bytes;
use futures::Stream;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;

use super::AudioDownloader;

/// File name offered to clients for archive downloads
pub const ARCHIVE_DOWNLOAD_NAME: &str = "playlist.zip";

const NOT_FOUND_MESSAGE: &str = "File not found or already deleted.";

/// A claimed artifact ready to be streamed
#[derive(Debug)]
pub struct Delivery {
    /// Job the artifact belongs to
    pub id: JobId,
    /// Name to offer in `Content-Disposition`
    pub download_name: String,
    /// MIME type derived from the file extension
    pub content_type: &'static str,
    /// Size in bytes
    pub content_length: u64,
    /// The bytes; dropping this schedules cleanup
    pub body: ArtifactStream,
}

/// Purges a job's storage once, when dropped
struct CleanupGuard {
    downloader: AudioDownloader,
    id: JobId,
    delivered: bool,
}

impl CleanupGuard {
    fn mark_delivered(&mut self) {
        if !self.delivered {
            self.delivered = true;
            self.downloader
                .registry
                .set_state(&self.id, JobState::Delivered);
            tracing::info!(job_id = %self.id, "artifact delivered");
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.delivered {
            tracing::debug!(job_id = %self.id, "retrieval ended before the artifact was fully sent");
            self.downloader.registry.set_state(&self.id, JobState::Failed);
        }

        let downloader = self.downloader.clone();
        let id = self.id.clone();
        let delay = downloader.config.retrieval.cleanup_delay;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    downloader.purge(&id).await;
                });
            }
            Err(_) => {
                // Leftovers are removed by the stale purge on next startup
                tracing::warn!(job_id = %id, "no runtime available, cleanup skipped");
            }
        }
    }
}

/// Byte stream of one artifact
///
/// Yields the file in chunks. The owning job is marked delivered when the last
/// chunk has been read, and purged (after the configured cleanup delay) when the
/// stream is dropped.
pub struct ArtifactStream {
    inner: ReaderStream<tokio::fs::File>,
    guard: CleanupGuard,
}

impl std::fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStream")
            .field("job_id", &self.guard.id)
            .field("delivered", &self.guard.delivered)
            .finish()
    }
}

impl Stream for ArtifactStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_next(cx);
        if let Poll::Ready(None) = poll {
            this.guard.mark_delivered();
        }
        poll
    }
}

impl AudioDownloader {
    /// Claim and open a single-file artifact
    ///
    /// `token` is validated before anything else is consulted. The filename must
    /// be exactly the one announced in the `SINGLE_FILE:` marker.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidJobId`] for a malformed token
    /// - [`Error::NotFound`] if there is no such ready artifact (unknown token,
    ///   wrong filename, already delivered, or vanished from disk)
    pub async fn retrieve_file(&self, token: &str, filename: &str) -> Result<Delivery> {
        let id = JobId::parse(token)?;
        let wanted = Artifact::SingleFile {
            filename: filename.to_string(),
        };
        if !self.registry.claim(&id, &wanted) {
            tracing::debug!(job_id = %id, filename, "no claimable file");
            return Err(Error::NotFound(NOT_FOUND_MESSAGE.into()));
        }

        let path = self.store.workspace_path(&id).join(filename);
        self.open_claimed(id, path, filename.to_string()).await
    }

    /// Claim and open an archive artifact
    ///
    /// # Errors
    ///
    /// Same as [`AudioDownloader::retrieve_file`].
    pub async fn retrieve_archive(&self, token: &str) -> Result<Delivery> {
        let id = JobId::parse(token)?;
        if !self.registry.claim(&id, &Artifact::Archive) {
            tracing::debug!(job_id = %id, "no claimable archive");
            return Err(Error::NotFound(NOT_FOUND_MESSAGE.into()));
        }

        let path = self.store.archive_path(&id);
        self.open_claimed(id, path, ARCHIVE_DOWNLOAD_NAME.to_string())
            .await
    }

    async fn open_claimed(&self, id: JobId, path: PathBuf, download_name: String) -> Result<Delivery> {
        // Armed before opening so every exit path below cleans up
        let guard = CleanupGuard {
            downloader: self.clone(),
            id: id.clone(),
            delivered: false,
        };

        let Some((file, content_length)) = self.store.open(&path).await? else {
            tracing::warn!(job_id = %id, path = %path.display(), "claimed artifact missing on disk");
            return Err(Error::NotFound(NOT_FOUND_MESSAGE.into()));
        };

        tracing::info!(job_id = %id, name = %download_name, bytes = content_length, "streaming artifact");
        Ok(Delivery {
            id,
            content_type: content_type_for(&download_name),
            download_name,
            content_length,
            body: ArtifactStream {
                inner: ReaderStream::new(file),
                guard,
            },
        })
    }
}
