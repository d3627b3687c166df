//! Local-filesystem workspace store

use super::WorkspaceStore;
use crate::error::{Error, Result};
use crate::types::{JobId, is_valid_token};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Workspace store rooted at a directory on local disk
#[derive(Clone, Debug)]
pub struct FsWorkspaceStore {
    root: PathBuf,
    purge_stale: bool,
}

impl FsWorkspaceStore {
    /// Create a store rooted at `root`
    ///
    /// Nothing is touched on disk until [`WorkspaceStore::init`] runs.
    pub fn new(root: impl Into<PathBuf>, purge_stale: bool) -> Self {
        Self {
            root: root.into(),
            purge_stale,
        }
    }

    /// The workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove token-named leftovers from a previous process
    async fn purge_stale_entries(&self) -> Result<usize> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    warn!(entry = name, error = %e, "failed to stat workspace entry");
                    continue;
                }
            };

            let result = if file_type.is_dir() && is_valid_token(name) {
                fs::remove_dir_all(entry.path()).await
            } else if file_type.is_file()
                && name.strip_suffix(".zip").is_some_and(is_valid_token)
            {
                fs::remove_file(entry.path()).await
            } else {
                continue;
            };

            match result {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(entry = name, error = %e, "failed to remove stale entry"),
            }
        }

        Ok(removed)
    }
}

#[async_trait]
impl WorkspaceStore for FsWorkspaceStore {
    async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create workspace root '{}': {}",
                    self.root.display(),
                    e
                ),
            ))
        })?;

        if self.purge_stale {
            let removed = self.purge_stale_entries().await?;
            if removed > 0 {
                info!(removed, root = %self.root.display(), "removed stale job workspaces");
            }
        }

        Ok(())
    }

    async fn create(&self, id: &JobId) -> Result<PathBuf> {
        let path = self.workspace_path(id);
        fs::create_dir_all(&path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create workspace '{}': {}", path.display(), e),
            ))
        })?;
        debug!(job_id = %id, path = %path.display(), "workspace allocated");
        Ok(path)
    }

    fn workspace_path(&self, id: &JobId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn archive_path(&self, id: &JobId) -> PathBuf {
        self.root.join(format!("{}.zip", id))
    }

    async fn list_files(&self, id: &JobId) -> Result<Vec<String>> {
        let dir = self.workspace_path(id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            // Follows symlinks; only regular files are deliverable.
            let is_file = fs::metadata(entry.path())
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => files.push(name),
                Err(raw) => warn!(job_id = %id, name = ?raw, "skipping non-UTF-8 file name"),
            }
        }

        files.sort();
        Ok(files)
    }

    async fn open(&self, path: &Path) -> Result<Option<(tokio::fs::File, u64)>> {
        let file = match fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some((file, metadata.len())))
    }

    async fn purge(&self, id: &JobId) -> Result<()> {
        let archive = self.archive_path(id);
        let workspace = self.workspace_path(id);
        let mut first_error = None;

        match fs::remove_file(&archive).await {
            Ok(()) => debug!(job_id = %id, "removed archive"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(job_id = %id, path = %archive.display(), error = %e, "failed to remove archive");
                first_error.get_or_insert(e);
            }
        }

        match fs::remove_dir_all(&workspace).await {
            Ok(()) => debug!(job_id = %id, "removed workspace"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(job_id = %id, path = %workspace.display(), error = %e, "failed to remove workspace");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(Error::Io(e)),
            None => Ok(()),
        }
    }
}
