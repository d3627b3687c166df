//! Artifact packaging
//!
//! Decides whether a finished job is delivered as its lone file or as a zip of
//! everything the extractor produced, and builds that zip.

mod archive;

pub use archive::build_archive;

use crate::error::PackagingError;
use crate::types::PackagingOutcome;

/// How a job's files will be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackagingPlan {
    /// Serve this file from the workspace as-is
    Single(String),
    /// Zip these files into `<token>.zip`
    Archive(Vec<String>),
}

impl PackagingPlan {
    /// Pick the delivery shape
    ///
    /// The enumerated count says what the client asked for, the files on disk say
    /// what it gets. A single file is only served bare when one item was asked for
    /// and one file exists; several files are never narrowed down to one.
    ///
    /// # Examples
    ///
    /// ```
    /// use audio_dl::packaging::PackagingPlan;
    ///
    /// let one = vec!["Song.m4a".to_string()];
    /// assert_eq!(PackagingPlan::decide(1, &one).unwrap(), PackagingPlan::Single("Song.m4a".into()));
    ///
    /// // A playlist where only one item survived is still a playlist
    /// assert!(matches!(PackagingPlan::decide(3, &one).unwrap(), PackagingPlan::Archive(_)));
    ///
    /// assert!(PackagingPlan::decide(1, &[]).is_err());
    /// ```
    pub fn decide(enumerated: usize, files: &[String]) -> Result<Self, PackagingError> {
        match files {
            [] => Err(PackagingError::NothingProduced),
            [only] if enumerated <= 1 => Ok(PackagingPlan::Single(only.clone())),
            _ => Ok(PackagingPlan::Archive(files.to_vec())),
        }
    }

    /// Outcome recorded on the job
    pub fn outcome(&self) -> PackagingOutcome {
        match self {
            PackagingPlan::Single(_) => PackagingOutcome::SingleFile,
            PackagingPlan::Archive(_) => PackagingOutcome::Archive,
        }
    }
}
