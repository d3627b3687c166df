//! Shared test helpers for creating AudioDownloader instances in tests.

use crate::config::Config;
use crate::downloader::{AudioDownloader, JobStream};
use crate::error::{ExtractionError, Result};
use crate::extraction::{
    AudioExtractor, DownloadReport, Enumeration, ExtractionOptions, ExtractorCapabilities,
};
use crate::types::JobId;
use crate::workspace::{FsWorkspaceStore, WorkspaceStore};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// Extractor that writes canned files instead of running yt-dlp
pub(crate) struct ScriptedExtractor {
    enumerated: usize,
    files: Vec<(String, Vec<u8>)>,
    stderr_tail: Option<String>,
    enumerate_error: Option<String>,
    download_delay: Duration,
    pub(crate) download_calls: AtomicUsize,
    pub(crate) last_options: Mutex<Option<ExtractionOptions>>,
}

impl ScriptedExtractor {
    /// `enumerated` items announced, `files` actually written
    pub(crate) fn new(enumerated: usize, files: &[(&str, &[u8])]) -> Self {
        Self {
            enumerated,
            files: files
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_vec()))
                .collect(),
            stderr_tail: None,
            enumerate_error: None,
            download_delay: Duration::ZERO,
            download_calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// One video producing one file
    pub(crate) fn single(name: &str, data: &[u8]) -> Self {
        Self::new(1, &[(name, data)])
    }

    /// Enumeration fails with `reason`
    pub(crate) fn unresolvable(reason: &str) -> Self {
        let mut extractor = Self::new(0, &[]);
        extractor.enumerate_error = Some(reason.to_string());
        extractor
    }

    /// Download reports per-item failures
    pub(crate) fn with_partial_failure(mut self, tail: &str) -> Self {
        self.stderr_tail = Some(tail.to_string());
        self
    }

    /// Download takes this long before writing anything
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }
}

#[async_trait]
impl AudioExtractor for ScriptedExtractor {
    async fn enumerate(&self, url: &str) -> Result<Enumeration> {
        if let Some(reason) = &self.enumerate_error {
            return Err(ExtractionError::EnumerationFailed {
                url: url.to_string(),
                reason: reason.clone(),
            }
            .into());
        }
        Ok(Enumeration {
            count: self.enumerated,
            title: None,
        })
    }

    async fn download(
        &self,
        _url: &str,
        workspace: &Path,
        options: &ExtractionOptions,
    ) -> Result<DownloadReport> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        if !self.download_delay.is_zero() {
            tokio::time::sleep(self.download_delay).await;
        }

        tokio::fs::create_dir_all(workspace).await?;
        for (name, data) in &self.files {
            tokio::fs::write(workspace.join(name), data).await?;
        }

        Ok(match &self.stderr_tail {
            Some(tail) => DownloadReport {
                success: false,
                stderr_tail: Some(tail.clone()),
            },
            None => DownloadReport::ok(),
        })
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities {
            can_extract: true,
            can_transcode: true,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Filesystem store that counts every call made to it
pub(crate) struct CountingStore {
    inner: FsWorkspaceStore,
    pub(crate) calls: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self {
            inner: FsWorkspaceStore::new(root, false),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkspaceStore for CountingStore {
    async fn init(&self) -> Result<()> {
        self.hit();
        self.inner.init().await
    }

    async fn create(&self, id: &JobId) -> Result<PathBuf> {
        self.hit();
        self.inner.create(id).await
    }

    fn workspace_path(&self, id: &JobId) -> PathBuf {
        self.hit();
        self.inner.workspace_path(id)
    }

    fn archive_path(&self, id: &JobId) -> PathBuf {
        self.hit();
        self.inner.archive_path(id)
    }

    async fn list_files(&self, id: &JobId) -> Result<Vec<String>> {
        self.hit();
        self.inner.list_files(id).await
    }

    async fn open(&self, path: &Path) -> Result<Option<(tokio::fs::File, u64)>> {
        self.hit();
        self.inner.open(path).await
    }

    async fn purge(&self, id: &JobId) -> Result<()> {
        self.hit();
        self.inner.purge(id).await
    }
}

/// Config rooted inside `temp` with immediate cleanup
pub(crate) fn test_config(temp: &Path) -> Config {
    let mut config = Config::default();
    config.workspace.temp_dir = temp.join("temp");
    config.workspace.purge_stale_on_startup = false;
    config.retrieval.cleanup_delay = Duration::ZERO;
    config.tools.search_path = false;
    config
}

/// Helper to create a test AudioDownloader backed by `extractor`.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(
    extractor: impl AudioExtractor + 'static,
) -> (AudioDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path());
    let store = Arc::new(FsWorkspaceStore::new(config.workspace.temp_dir.clone(), false));

    let downloader = AudioDownloader::with_components(config, store, Arc::new(extractor))
        .await
        .unwrap();

    (downloader, temp_dir)
}

/// Same as [`create_test_downloader`], but with a [`CountingStore`] the test can inspect
pub(crate) async fn create_counting_downloader(
    extractor: impl AudioExtractor + 'static,
) -> (AudioDownloader, Arc<CountingStore>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path());
    let store = Arc::new(CountingStore::new(config.workspace.temp_dir.clone()));

    let downloader =
        AudioDownloader::with_components(config, store.clone(), Arc::new(extractor))
            .await
            .unwrap();

    (downloader, store, temp_dir)
}

/// Read a job's progress stream to the end
pub(crate) async fn collect_lines(job: JobStream) -> Vec<String> {
    tokio::time::timeout(Duration::from_secs(10), job.lines.collect::<Vec<_>>())
        .await
        .expect("progress stream did not finish")
}

/// Read an artifact stream to the end
pub(crate) async fn collect_body(body: crate::downloader::ArtifactStream) -> Vec<u8> {
    let mut body = body;
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk.unwrap());
    }
    bytes
}

/// Wait until `condition` holds, polling briefly
pub(crate) async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}
