//! Test configuration helpers and downloader construction

use audio_dl::extraction::AudioExtractor;
use audio_dl::{AudioDownloader, Config, FsWorkspaceStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Config rooted inside `temp` with immediate cleanup and no PATH lookups
pub fn test_config(temp: &Path) -> Config {
    let mut config = Config::default();
    config.workspace.temp_dir = temp.join("temp");
    config.workspace.purge_stale_on_startup = false;
    config.retrieval.cleanup_delay = Duration::ZERO;
    config.tools.search_path = false;
    config.server.api.bind_address = ([127, 0, 0, 1], 0).into();
    config
}

/// Create an AudioDownloader backed by `extractor`
///
/// Returns the downloader and temp directory (keep temp_dir alive for test duration)
pub async fn create_downloader(
    extractor: impl AudioExtractor + 'static,
) -> (Arc<AudioDownloader>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(temp_dir.path());
    let store = Arc::new(FsWorkspaceStore::new(
        config.workspace.temp_dir.clone(),
        false,
    ));

    let downloader = AudioDownloader::with_components(config, store, Arc::new(extractor))
        .await
        .expect("downloader");

    (Arc::new(downloader), temp_dir)
}

/// Create an AudioDownloader that resolves yt-dlp and ffmpeg from PATH
///
/// Returns `None` when yt-dlp is not installed.
pub async fn create_live_downloader() -> Option<(Arc<AudioDownloader>, TempDir)> {
    dotenvy::dotenv().ok();

    let temp_dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(temp_dir.path());
    config.tools.search_path = true;

    let downloader = AudioDownloader::new(config).await.expect("downloader");
    if !downloader.capabilities().can_extract {
        return None;
    }
    Some((Arc::new(downloader), temp_dir))
}
