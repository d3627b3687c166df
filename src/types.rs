//! Core types for audio-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum accepted token length on the retrieval paths
const MAX_JOB_ID_LEN: usize = 64;

/// Opaque, unguessable job token (`[a-z0-9-]+`)
///
/// Tokens are generated from a random v4 UUID in its lowercase hyphenated form,
/// which makes them safe to use as a path component under the workspace root.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh token
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Validate a client-supplied token
    ///
    /// This is a pure string check and never touches the filesystem.
    ///
    /// # Examples
    ///
    /// ```
    /// use audio_dl::JobId;
    ///
    /// assert!(JobId::parse("0f8e2c1a-3b4d-4e5f-8a9b-0c1d2e3f4a5b").is_ok());
    /// assert!(JobId::parse("../../etc/passwd").is_err());
    /// assert!(JobId::parse("ABC").is_err());
    /// ```
    pub fn parse(raw: &str) -> crate::Result<Self> {
        if is_valid_token(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(crate::Error::InvalidJobId(raw.to_string()))
        }
    }

    /// Borrow the token text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns true if `raw` is non-empty, at most 64 chars, and only `[a-z0-9-]`
#[must_use]
pub fn is_valid_token(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_JOB_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Requested audio processing mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AudioFormat {
    /// Best native m4a stream, no transcoding (default)
    #[default]
    #[serde(rename = "m4a", alias = "fast")]
    Fast,
    /// Any best audio stream, transcoded to mp3
    #[serde(rename = "mp3", alias = "compatible")]
    Compatible,
}

impl AudioFormat {
    /// The first line of every progress stream for this mode
    pub fn mode_line(&self) -> &'static str {
        match self {
            AudioFormat::Fast => "Mode: Fastest (M4A). Skipping conversion.",
            AudioFormat::Compatible => "Mode: Compatible (MP3). Conversion will be slower.",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFormat::Fast => f.write_str("m4a"),
            AudioFormat::Compatible => f.write_str("mp3"),
        }
    }
}

/// Job lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Workspace allocated
    Created,
    /// External tool running
    Extracting,
    /// Deciding and building the artifact
    Packaging,
    /// Artifact on disk, waiting for retrieval
    Ready,
    /// Claimed by a retrieval request
    Delivering,
    /// Byte stream consumed
    Delivered,
    /// Extraction, packaging or delivery failed
    Failed,
    /// Backing storage removed
    Purged,
}

impl JobState {
    /// Whether the orphan sweeper may purge a job in this state
    ///
    /// Everything except a pipeline at work or an artifact mid-stream.
    pub fn is_idle(&self) -> bool {
        matches!(
            self,
            JobState::Ready | JobState::Delivered | JobState::Failed
        )
    }
}

/// The single deliverable of a finished job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// The lone downloaded file, served as-is from the workspace
    SingleFile {
        /// File name inside the workspace
        filename: String,
    },
    /// `<token>.zip` next to the workspace
    Archive,
}

/// How a job's output was packaged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PackagingOutcome {
    /// One file, no compression
    SingleFile,
    /// Zip archive of every produced file
    Archive,
}

/// Terminal line of a progress stream
///
/// Exactly one marker ends every stream. Clients dispatch on the prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressMarker {
    /// `SINGLE_FILE:<token>:<filename>`
    SingleFile {
        /// Job token
        id: JobId,
        /// File to request from `/get_file/<token>/<filename>`
        filename: String,
    },
    /// `ALL_DONE:<token>`
    AllDone {
        /// Job token
        id: JobId,
    },
    /// `FAILED:<token>`
    Failed {
        /// Job token
        id: JobId,
    },
}

impl ProgressMarker {
    /// Parse a progress line back into a marker, if it is one
    ///
    /// # Examples
    ///
    /// ```
    /// use audio_dl::types::ProgressMarker;
    ///
    /// let line = "SINGLE_FILE:0f8e2c1a-3b4d:Intro: Live.m4a";
    /// match ProgressMarker::parse(line) {
    ///     Some(ProgressMarker::SingleFile { filename, .. }) => assert_eq!(filename, "Intro: Live.m4a"),
    ///     other => panic!("unexpected {other:?}"),
    /// }
    /// assert!(ProgressMarker::parse("Zipped: a.m4a").is_none());
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (kind, rest) = line.split_once(':')?;
        match kind {
            "SINGLE_FILE" => {
                let (id, filename) = rest.split_once(':')?;
                Some(ProgressMarker::SingleFile {
                    id: JobId::parse(id).ok()?,
                    filename: filename.to_string(),
                })
            }
            "ALL_DONE" => Some(ProgressMarker::AllDone {
                id: JobId::parse(rest).ok()?,
            }),
            "FAILED" => Some(ProgressMarker::Failed {
                id: JobId::parse(rest).ok()?,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProgressMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressMarker::SingleFile { id, filename } => {
                write!(f, "SINGLE_FILE:{}:{}", id, filename)
            }
            ProgressMarker::AllDone { id } => write!(f, "ALL_DONE:{}", id),
            ProgressMarker::Failed { id } => write!(f, "FAILED:{}", id),
        }
    }
}

/// Snapshot of a job for diagnostics
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobInfo {
    /// Job token
    #[schema(value_type = String)]
    pub id: String,
    /// Requested URL
    pub url: String,
    /// Requested mode
    pub format: AudioFormat,
    /// Current lifecycle state
    pub state: JobState,
    /// Item count from metadata enumeration
    pub enumerated: Option<usize>,
    /// Files found in the workspace after extraction
    pub files: Vec<String>,
    /// Packaging result, once decided
    pub outcome: Option<PackagingOutcome>,
    /// When the job was submitted
    pub created_at: DateTime<Utc>,
    /// Last state transition
    pub updated_at: DateTime<Utc>,
}

/// Public view of a job, without anything that grants retrieval
///
/// The token, URL and file names stay private to the submitter.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobSummary {
    /// Requested mode
    pub format: AudioFormat,
    /// Current lifecycle state
    pub state: JobState,
    /// Item count from metadata enumeration
    pub enumerated: Option<usize>,
    /// Number of files found after extraction
    pub file_count: usize,
    /// Packaging result, once decided
    pub outcome: Option<PackagingOutcome>,
    /// When the job was submitted
    pub created_at: DateTime<Utc>,
    /// Last state transition
    pub updated_at: DateTime<Utc>,
}

impl From<JobInfo> for JobSummary {
    fn from(info: JobInfo) -> Self {
        Self {
            format: info.format,
            state: info.state,
            enumerated: info.enumerated,
            file_count: info.files.len(),
            outcome: info.outcome,
            created_at: info.created_at,
            updated_at: info.updated_at,
        }
    }
}

/// Runtime capabilities
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Capabilities {
    /// Name of the active extractor implementation
    pub extractor: String,
    /// Whether jobs can actually download anything
    pub can_extract: bool,
    /// Whether the compatible (mp3) mode can transcode
    pub can_transcode: bool,
}
