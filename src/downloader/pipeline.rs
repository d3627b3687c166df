//! Job submission and the progress-streaming worker.

use crate::error::{Error, Result};
use crate::extraction::{ExtractionOptions, is_incomplete_download};
use crate::packaging::{PackagingPlan, build_archive};
use crate::types::{Artifact, AudioFormat, JobId, JobState, ProgressMarker};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::AudioDownloader;

/// An accepted job and its live progress lines
///
/// Every line ends in `\n`. The last line is always exactly one
/// [`ProgressMarker`]; the stream ends right after it.
#[derive(Debug)]
pub struct JobStream {
    /// Token of the accepted job
    pub id: JobId,
    /// Progress lines as they are produced
    pub lines: ReceiverStream<String>,
}

/// Sending half of a job's progress channel
#[derive(Clone)]
struct ProgressSink {
    id: JobId,
    tx: mpsc::Sender<String>,
}

impl ProgressSink {
    async fn line(&self, text: impl Into<String>) {
        let mut line = text.into();
        line.push('\n');
        if self.tx.send(line).await.is_err() {
            // Client went away; the job still runs to completion
            tracing::trace!(job_id = %self.id, "progress line dropped, no reader");
        }
    }

    /// For use from `spawn_blocking` threads only
    fn blocking_line(&self, text: impl Into<String>) {
        let mut line = text.into();
        line.push('\n');
        if self.tx.blocking_send(line).is_err() {
            tracing::trace!(job_id = %self.id, "progress line dropped, no reader");
        }
    }
}

/// Human-readable `Error: ...` line for a failed job
fn error_line(error: &Error) -> String {
    let message = match error {
        Error::Extraction(inner) => inner.to_string(),
        Error::Packaging(inner) => inner.to_string(),
        other => other.to_string(),
    };
    format!("Error: {}.", message.trim_end_matches('.'))
}

impl AudioDownloader {
    /// Accept a download job and start it in the background
    ///
    /// Returns as soon as the job's workspace exists. The pipeline runs on its own
    /// task and writes progress into the returned stream; a reader that goes away
    /// does not stop it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if `url` is blank
    /// - [`Error::ShuttingDown`] once [`AudioDownloader::shutdown`] has begun
    /// - [`Error::Io`] if the workspace cannot be created
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use audio_dl::{AudioDownloader, AudioFormat, Config};
    /// use futures::StreamExt;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = AudioDownloader::new(Config::default()).await?;
    ///
    ///     let mut job = downloader
    ///         .submit("https://www.youtube.com/playlist?list=PL123", AudioFormat::Compatible)
    ///         .await?;
    ///     while let Some(line) = job.lines.next().await {
    ///         print!("{line}");
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn submit(&self, url: &str, format: AudioFormat) -> Result<JobStream> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidRequest("url must not be empty".into()));
        }
        if !self
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::ShuttingDown);
        }

        let id = JobId::new();
        let workspace = self.store.create(&id).await?;
        self.registry.insert(id.clone(), url.to_string(), format);

        let (tx, rx) = mpsc::channel(self.config.workspace.progress_buffer.max(1));
        let sink = ProgressSink { id: id.clone(), tx };

        tracing::info!(job_id = %id, url, %format, "job accepted");

        let downloader = self.clone();
        let job_url = url.to_string();
        tokio::spawn(async move {
            downloader.run_job(job_url, format, workspace, sink).await;
        });

        Ok(JobStream {
            id,
            lines: ReceiverStream::new(rx),
        })
    }

    /// Drive one job to its terminal marker
    async fn run_job(&self, url: String, format: AudioFormat, workspace: PathBuf, sink: ProgressSink) {
        let id = sink.id.clone();
        sink.line(format.mode_line()).await;

        let marker = match self.execute(&url, format, &workspace, &sink).await {
            Ok(marker) => {
                tracing::info!(job_id = %id, marker = %marker, "job ready");
                marker
            }
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "job failed");
                sink.line(error_line(&e)).await;
                self.registry.set_state(&id, JobState::Failed);
                self.purge(&id).await;
                ProgressMarker::Failed { id }
            }
        };

        sink.line(marker.to_string()).await;
    }

    async fn execute(
        &self,
        url: &str,
        format: AudioFormat,
        workspace: &std::path::Path,
        sink: &ProgressSink,
    ) -> Result<ProgressMarker> {
        let id = &sink.id;
        if !self.registry.set_state(id, JobState::Extracting) {
            return Err(Error::ShuttingDown);
        }

        // Metadata pass
        let listing = self.extractor.enumerate(url).await?;
        self.registry
            .update(id, |record| record.enumerated = Some(listing.count));
        sink.line(format!(
            "Found {} item(s). Starting download...",
            listing.count
        ))
        .await;

        // Download pass
        let options = ExtractionOptions::from(format);
        let report = self.extractor.download(url, workspace, &options).await?;
        if !report.success {
            sink.line(format!(
                "Warning: some items could not be downloaded: {}",
                report.stderr_tail.as_deref().unwrap_or("unknown error")
            ))
            .await;
        }

        // Inspection
        let files: Vec<String> = self
            .store
            .list_files(id)
            .await?
            .into_iter()
            .filter(|name| !is_incomplete_download(name))
            .collect();
        sink.line(format!(
            "Downloaded {} of {} item(s).",
            files.len(),
            listing.count
        ))
        .await;

        let recorded = files.clone();
        if !self.registry.update(id, |record| {
            record.files = recorded;
            record.state = JobState::Packaging;
        }) {
            return Err(Error::ShuttingDown);
        }

        let plan = PackagingPlan::decide(listing.count, &files)?;
        let outcome = plan.outcome();
        match plan {
            PackagingPlan::Single(filename) => {
                let artifact = Artifact::SingleFile {
                    filename: filename.clone(),
                };
                if !self.registry.mark_ready(id, artifact, outcome) {
                    return Err(Error::ShuttingDown);
                }
                Ok(ProgressMarker::SingleFile {
                    id: id.clone(),
                    filename,
                })
            }
            PackagingPlan::Archive(files) => {
                sink.line("Zipping files... this might take a moment.").await;

                let entry_sink = sink.clone();
                let archived = build_archive(
                    workspace,
                    &files,
                    &self.store.archive_path(id),
                    move |name| entry_sink.blocking_line(format!("Zipped: {}", name)),
                )
                .await?;
                tracing::debug!(job_id = %id, entries = archived.len(), "archive built");

                sink.line("Zip file created successfully.").await;
                if !self.registry.mark_ready(id, Artifact::Archive, outcome) {
                    return Err(Error::ShuttingDown);
                }
                Ok(ProgressMarker::AllDone { id: id.clone() })
            }
        }
    }
}
