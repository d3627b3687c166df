//! Error types for audio-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Extraction, Packaging)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for audio-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for audio-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "temp_dir")
        key: Option<String>,
    },

    /// Malformed client input (missing URL, bad request body)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Job token contains characters outside `[a-z0-9-]` or has a bad length
    #[error("invalid download ID: {0:?}")]
    InvalidJobId(String),

    /// Artifact unknown, already delivered, or never materialized
    #[error("not found: {0}")]
    NotFound(String),

    /// Metadata enumeration failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Packaging failed after download
    #[error("packaging error: {0}")]
    Packaging(#[from] PackagingError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// External tool execution failed (yt-dlp, ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary)
    #[error("not supported: {0}")]
    NotSupported(String),
}

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Metadata enumeration returned an error or unparseable output
    #[error("could not resolve {url}: {reason}")]
    EnumerationFailed {
        /// The URL being enumerated
        url: String,
        /// The reason enumeration failed
        reason: String,
    },
}

/// Packaging errors (single-file selection and archive creation)
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The workspace held no files after extraction
    #[error("no audio files were produced")]
    NothingProduced,

    /// Enumeration and disk contents disagree in a way that cannot be packaged
    #[error("inconsistent workspace: {reason}")]
    Inconsistent {
        /// What disagreed
        reason: String,
    },

    /// Writing the archive failed
    #[error("failed to write archive {path}: {reason}")]
    ArchiveWrite {
        /// Archive path
        path: PathBuf,
        /// The reason writing failed
        reason: String,
    },

    /// The archive was missing or empty after it was closed
    #[error("archive {path} missing after write")]
    ArchiveMissing {
        /// Archive path
        path: PathBuf,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_job_id",
///     "message": "invalid download ID: \"../etc\""
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "invalid_request")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create an "invalid request" error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,
            Error::InvalidJobId(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 422 Unprocessable Entity - nothing deliverable came out of the job
            Error::Packaging(_) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - the extractor's upstream failed
            Error::Extraction(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
            Error::ExternalTool(_) => 503,

            // 501 Not Implemented - Feature not supported
            Error::NotSupported(_) => 501,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::InvalidJobId(_) => "invalid_job_id",
            Error::NotFound(_) => "not_found",
            Error::Extraction(e) => match e {
                ExtractionError::EnumerationFailed { .. } => "enumeration_failed",
            },
            Error::Packaging(e) => match e {
                PackagingError::NothingProduced => "nothing_produced",
                PackagingError::Inconsistent { .. } => "inconsistent_workspace",
                PackagingError::ArchiveWrite { .. } => "archive_write_failed",
                PackagingError::ArchiveMissing { .. } => "archive_missing",
            },
            Error::Io(_) => "io_error",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Extraction(ExtractionError::EnumerationFailed { url, .. }) => {
                Some(serde_json::json!({
                    "url": url,
                }))
            }
            Error::Packaging(
                PackagingError::ArchiveWrite { path, .. } | PackagingError::ArchiveMissing { path },
            ) => Some(serde_json::json!({
                "archive": path,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
