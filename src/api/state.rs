//! Application state for the API server

use crate::{AudioDownloader, Config};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (Arc clones only).
#[derive(Clone)]
pub struct AppState {
    /// The orchestrator behind every route
    pub downloader: Arc<AudioDownloader>,

    /// Configuration the router was built with
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<AudioDownloader>, config: Arc<Config>) -> Self {
        Self { downloader, config }
    }
}
