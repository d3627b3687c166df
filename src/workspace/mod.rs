//! Per-job scratch storage
//!
//! Every job owns two filesystem entries under the workspace root, both named
//! after its token:
//!
//! - `<root>/<token>/` holds the files written by the extractor
//! - `<root>/<token>.zip` holds the archive, for multi-item jobs only
//!
//! The [`WorkspaceStore`] trait is the only way the rest of the crate touches
//! those paths, so alternative stores (or instrumented ones in tests) can be
//! swapped in.

mod fs;

pub use fs::FsWorkspaceStore;

use crate::error::Result;
use crate::types::JobId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Storage backend for job workspaces and artifacts
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Ensure the root exists. Idempotent; may also drop stale entries.
    async fn init(&self) -> Result<()>;

    /// Allocate the job's workspace directory and return its path
    async fn create(&self, id: &JobId) -> Result<PathBuf>;

    /// Where the job's raw files live
    fn workspace_path(&self, id: &JobId) -> PathBuf;

    /// Where the job's archive is written
    fn archive_path(&self, id: &JobId) -> PathBuf;

    /// Names of regular files in the job's workspace, sorted
    ///
    /// Subdirectories and non-UTF-8 names are skipped.
    async fn list_files(&self, id: &JobId) -> Result<Vec<String>>;

    /// Open an artifact for streaming
    ///
    /// Returns `Ok(None)` when the file does not exist.
    async fn open(&self, path: &Path) -> Result<Option<(tokio::fs::File, u64)>>;

    /// Remove the job's workspace and archive
    ///
    /// Missing entries are not an error, so calling this twice is fine.
    async fn purge(&self, id: &JobId) -> Result<()>;
}
