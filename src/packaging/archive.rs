use crate::error::{Error, PackagingError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

/// Zip `files` from `workspace` into `archive_path`
///
/// Each file is stored under its base name with deflate compression. Files that
/// are missing or not regular files by now are skipped with a warning.
/// `on_entry` is called with the entry name right after each entry is written;
/// it runs on the blocking thread, so it must not block on the async runtime.
///
/// After the writer is closed the archive is checked on disk: it must exist and
/// be non-empty.
///
/// Returns the names that went into the archive, in order.
pub async fn build_archive<F>(
    workspace: &Path,
    files: &[String],
    archive_path: &Path,
    mut on_entry: F,
) -> Result<Vec<String>>
where
    F: FnMut(&str) + Send + 'static,
{
    let workspace_owned = workspace.to_path_buf();
    let files_owned = files.to_vec();
    let archive_owned = archive_path.to_path_buf();

    let written = spawn_blocking(move || {
        write_archive(&workspace_owned, &files_owned, &archive_owned, &mut on_entry)
    })
    .await
    .map_err(|e| {
        Error::Packaging(PackagingError::ArchiveWrite {
            path: archive_path.to_path_buf(),
            reason: format!("archive task panicked: {}", e),
        })
    })??;

    verify_archive(archive_path).await?;
    debug!(archive = %archive_path.display(), entries = written.len(), "archive verified");
    Ok(written)
}

fn write_failed(path: &Path, reason: impl std::fmt::Display) -> PackagingError {
    PackagingError::ArchiveWrite {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn write_archive(
    workspace: &Path,
    files: &[String],
    archive_path: &Path,
    on_entry: &mut dyn FnMut(&str),
) -> std::result::Result<Vec<String>, PackagingError> {
    let file = std::fs::File::create(archive_path).map_err(|e| write_failed(archive_path, e))?;
    let mut zip = ZipWriter::new(std::io::BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = Vec::with_capacity(files.len());
    for name in files {
        let source: PathBuf = workspace.join(name);

        // Skip anything that is no longer a regular file
        let len = match std::fs::metadata(&source) {
            Ok(m) if m.is_file() => m.len(),
            Ok(_) => {
                warn!(file = %name, "skipping non-regular file");
                continue;
            }
            Err(e) => {
                warn!(file = %name, error = %e, "skipping unreadable file");
                continue;
            }
        };

        let mut input = std::fs::File::open(&source).map_err(|e| write_failed(archive_path, e))?;
        zip.start_file(name.as_str(), options.large_file(len >= u64::from(u32::MAX)))
            .map_err(|e| write_failed(archive_path, format!("entry {}: {}", name, e)))?;
        std::io::copy(&mut input, &mut zip)
            .map_err(|e| write_failed(archive_path, format!("entry {}: {}", name, e)))?;

        on_entry(name);
        written.push(name.clone());
    }

    let mut inner = zip.finish().map_err(|e| write_failed(archive_path, e))?;
    inner.flush().map_err(|e| write_failed(archive_path, e))?;
    drop(inner);

    if written.is_empty() {
        return Err(PackagingError::Inconsistent {
            reason: format!("none of {} listed file(s) could be archived", files.len()),
        });
    }

    Ok(written)
}

async fn verify_archive(archive_path: &Path) -> std::result::Result<(), PackagingError> {
    match tokio::fs::metadata(archive_path).await {
        Ok(m) if m.is_file() && m.len() > 0 => Ok(()),
        _ => Err(PackagingError::ArchiveMissing {
            path: archive_path.to_path_buf(),
        }),
    }
}
