//! Construction, orphan sweeping and shutdown coordination.

use crate::config::Config;
use crate::error::Result;
use crate::extraction::{AudioExtractor, UnavailableExtractor, YtDlpExtractor};
use crate::types::{Capabilities, JobId, JobInfo, JobSummary};
use crate::workspace::{FsWorkspaceStore, WorkspaceStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::AudioDownloader;
use super::registry::JobRegistry;

impl AudioDownloader {
    /// Create a new AudioDownloader instance
    ///
    /// This initializes all core components:
    /// - Creates the workspace root (and drops stale workspaces from a previous run)
    /// - Resolves the yt-dlp binary, falling back to [`UnavailableExtractor`]
    /// - Sets up the empty job registry
    ///
    /// The orphan sweeper is not started here; see [`AudioDownloader::start_sweeper`].
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn WorkspaceStore> = Arc::new(FsWorkspaceStore::new(
            config.workspace.temp_dir.clone(),
            config.workspace.purge_stale_on_startup,
        ));

        let extractor: Arc<dyn AudioExtractor> = match YtDlpExtractor::from_config(&config.tools) {
            Some(extractor) => Arc::new(extractor),
            None => {
                tracing::warn!("yt-dlp not found; every job will fail until it is installed");
                Arc::new(UnavailableExtractor)
            }
        };

        let caps = extractor.capabilities();
        tracing::info!(
            extractor = extractor.name(),
            can_extract = caps.can_extract,
            can_transcode = caps.can_transcode,
            "Extractor initialized"
        );

        Self::with_components(config, store, extractor).await
    }

    /// Create an instance from explicit parts
    ///
    /// Runs the store's `init()`; everything else is taken as given.
    pub async fn with_components(
        config: Config,
        store: Arc<dyn WorkspaceStore>,
        extractor: Arc<dyn AudioExtractor>,
    ) -> Result<Self> {
        store.init().await?;

        Ok(Self {
            config: Arc::new(config),
            store,
            extractor,
            registry: JobRegistry::default(),
            accepting_new: Arc::new(AtomicBool::new(true)),
            sweeper_cancel: tokio_util::sync::CancellationToken::new(),
        })
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Query what the active extractor can do
    pub fn capabilities(&self) -> Capabilities {
        let caps = self.extractor.capabilities();
        Capabilities {
            extractor: self.extractor.name().to_string(),
            can_extract: caps.can_extract,
            can_transcode: caps.can_transcode,
        }
    }

    /// Snapshot of every job the registry still knows, oldest first
    pub fn jobs(&self) -> Vec<JobInfo> {
        self.registry.snapshot()
    }

    /// Redacted snapshot of every job, safe to show to any client
    pub fn job_summaries(&self) -> Vec<JobSummary> {
        self.jobs().into_iter().map(JobSummary::from).collect()
    }

    /// Remove a job's storage and forget it
    ///
    /// Idempotent. Storage errors are logged, never returned.
    pub(crate) async fn purge(&self, id: &JobId) {
        if let Err(e) = self.store.purge(id).await {
            tracing::warn!(job_id = %id, error = %e, "cleanup failed");
        } else {
            tracing::debug!(job_id = %id, "job purged");
        }
        self.registry.remove(id);
    }

    /// Purge ready or failed jobs whose artifact has waited longer than `orphan_ttl`
    ///
    /// Returns the number of jobs purged. Jobs being extracted, packaged or
    /// delivered are never touched.
    pub async fn sweep_orphans(&self) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(self.config.retrieval.orphan_ttl) else {
            return 0;
        };
        let Some(cutoff) = chrono::Utc::now().checked_sub_signed(ttl) else {
            return 0;
        };

        let orphans = self.registry.take_idle_before(cutoff);
        for id in &orphans {
            tracing::info!(job_id = %id, "sweeping unretrieved artifact");
            self.purge(id).await;
        }
        orphans.len()
    }

    /// Start the orphan sweeper background task
    ///
    /// Runs [`AudioDownloader::sweep_orphans`] every `sweep_interval` until
    /// [`AudioDownloader::shutdown`] is called.
    pub fn start_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let downloader = self.clone();
        let period = self.config.retrieval.sweep_interval.max(std::time::Duration::from_secs(1));
        let cancel = self.sweeper_cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let swept = downloader.sweep_orphans().await;
                        if swept > 0 {
                            tracing::info!(swept, "orphan sweep finished");
                        }
                    }
                }
            }
            tracing::debug!("orphan sweeper stopped");
        });

        tracing::info!(interval_secs = period.as_secs(), "Orphan sweeper background task started");
        handle
    }

    /// Whether new jobs are still accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new jobs
    /// 2. Stops the orphan sweeper
    /// 3. Purges every job whose artifact is not streaming right now, including
    ///    finished deliveries still waiting out their cleanup delay
    ///
    /// Pipelines still running for a purged job notice at their next step,
    /// remove what they wrote and end their stream with `FAILED:`. Deliveries in
    /// flight finish and clean up through their own guard.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        self.sweeper_cancel.cancel();

        let pending = self.registry.take_all_not_streaming();
        for id in &pending {
            self.purge(id).await;
        }

        tracing::info!(purged = pending.len(), "Graceful shutdown complete");
        Ok(())
    }
}
