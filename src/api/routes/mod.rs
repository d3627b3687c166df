//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`] - Job submission and the progress stream
//! - [`retrieval`] - One-shot artifact delivery
//! - [`system`] - Health, capabilities, job diagnostics, OpenAPI

use crate::types::AudioFormat;
use serde::{Deserialize, Serialize};

mod downloads;
mod retrieval;
mod system;

pub use downloads::*;
pub use retrieval::*;
pub use system::*;

/// Request body for POST /download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Video or playlist URL
    #[serde(default)]
    pub url: String,
    /// `"m4a"` (fast, default) or `"mp3"` (compatible)
    #[serde(default)]
    pub format: AudioFormat,
}
