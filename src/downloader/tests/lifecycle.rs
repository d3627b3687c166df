use super::*;
use crate::types::JobId;
use std::time::Duration;

#[tokio::test]
async fn new_without_yt_dlp_falls_back_to_unavailable_extractor() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());

    let downloader = AudioDownloader::new(config).await.unwrap();

    let caps = downloader.capabilities();
    assert_eq!(caps.extractor, "unavailable");
    assert!(!caps.can_extract);
    assert!(temp.path().join("temp").is_dir(), "workspace root created");

    let job = downloader
        .submit("https://example/single", AudioFormat::Fast)
        .await
        .unwrap();
    let id = job.id.clone();
    let lines = collect_lines(job).await;

    assert!(lines[lines.len() - 2].starts_with("Error: not supported:"));
    assert!(lines[lines.len() - 2].contains("yt-dlp"));
    assert_eq!(lines.last().unwrap(), &format!("FAILED:{}\n", id));
}

#[tokio::test]
async fn new_purges_stale_workspaces_from_previous_run() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = test_config(temp.path());
    config.workspace.purge_stale_on_startup = true;
    let stale = JobId::new();
    std::fs::create_dir_all(config.workspace.temp_dir.join(stale.as_str())).unwrap();
    std::fs::write(config.workspace.temp_dir.join(format!("{stale}.zip")), b"zip").unwrap();

    let _downloader = AudioDownloader::new(config.clone()).await.unwrap();

    assert!(!config.workspace.temp_dir.join(stale.as_str()).exists());
    assert!(!config.workspace.temp_dir.join(format!("{stale}.zip")).exists());
}

#[tokio::test]
async fn shutdown_rejects_new_jobs() {
    let (downloader, _temp) =
        create_test_downloader(ScriptedExtractor::single("Song.m4a", b"audio")).await;
    assert!(downloader.is_accepting());

    downloader.shutdown().await.unwrap();

    assert!(!downloader.is_accepting());
    let err = downloader
        .submit("https://example/single", AudioFormat::Fast)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
}

#[tokio::test]
async fn shutdown_purges_idle_jobs_but_spares_deliveries() {
    let (downloader, _temp) =
        create_test_downloader(ScriptedExtractor::single("Song.m4a", b"audio")).await;

    let idle = collect_job(&downloader).await;
    let delivering = collect_job(&downloader).await;
    let delivery = downloader
        .retrieve_file(delivering.as_str(), "Song.m4a")
        .await
        .unwrap();

    downloader.shutdown().await.unwrap();

    assert!(!downloader.store.workspace_path(&idle).exists());
    assert_eq!(downloader.registry.state(&idle), None);
    assert_eq!(
        downloader.registry.state(&delivering),
        Some(JobState::Delivering)
    );

    let bytes = collect_body(delivery.body).await;
    assert_eq!(bytes, b"audio");
}

#[tokio::test]
async fn shutdown_purges_delivered_jobs_waiting_on_cleanup_delay() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = test_config(temp.path());
    config.retrieval.cleanup_delay = Duration::from_millis(500);
    let downloader = with_config(config).await;
    let id = collect_job(&downloader).await;
    let workspace = downloader.store.workspace_path(&id);

    let delivery = downloader
        .retrieve_file(id.as_str(), "Song.m4a")
        .await
        .unwrap();
    assert_eq!(collect_body(delivery.body).await, b"audio");
    assert!(workspace.exists(), "cleanup is still waiting out its delay");

    downloader.shutdown().await.unwrap();

    assert!(!workspace.exists());
    assert!(downloader.jobs().is_empty());
}

#[tokio::test]
async fn shutdown_purges_abandoned_deliveries_waiting_on_cleanup_delay() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = test_config(temp.path());
    config.retrieval.cleanup_delay = Duration::from_secs(30);
    let downloader = with_config(config).await;
    let id = collect_job(&downloader).await;
    let workspace = downloader.store.workspace_path(&id);

    let delivery = downloader
        .retrieve_file(id.as_str(), "Song.m4a")
        .await
        .unwrap();
    drop(delivery);
    assert_eq!(downloader.registry.state(&id), Some(JobState::Failed));

    downloader.shutdown().await.unwrap();

    assert!(!workspace.exists());
    assert!(downloader.jobs().is_empty());
}

#[tokio::test]
async fn job_in_flight_at_shutdown_ends_failed_and_clean() {
    let extractor =
        ScriptedExtractor::single("Song.m4a", b"audio").with_delay(Duration::from_millis(100));
    let (downloader, _temp) = create_test_downloader(extractor).await;

    let job = downloader
        .submit("https://example/single", AudioFormat::Fast)
        .await
        .unwrap();
    let id = job.id.clone();
    downloader.shutdown().await.unwrap();
    let lines = collect_lines(job).await;

    assert_eq!(lines.last().unwrap(), &format!("FAILED:{}\n", id));
    assert!(!downloader.store.workspace_path(&id).exists());
    assert!(downloader.jobs().is_empty());
}

#[tokio::test]
async fn sweep_removes_expired_artifacts_only() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = test_config(temp.path());
    config.retrieval.orphan_ttl = Duration::ZERO;
    let store = Arc::new(crate::workspace::FsWorkspaceStore::new(
        config.workspace.temp_dir.clone(),
        false,
    ));
    let downloader = AudioDownloader::with_components(
        config,
        store,
        Arc::new(ScriptedExtractor::single("Song.m4a", b"audio")),
    )
    .await
    .unwrap();

    let id = collect_job(&downloader).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(downloader.sweep_orphans().await, 1);
    assert!(!downloader.store.workspace_path(&id).exists());
    assert!(downloader.jobs().is_empty());
    assert!(matches!(
        downloader.retrieve_file(id.as_str(), "Song.m4a").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn sweep_removes_finished_deliveries_whose_cleanup_never_ran() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = test_config(temp.path());
    config.retrieval.orphan_ttl = Duration::ZERO;
    config.retrieval.cleanup_delay = Duration::from_secs(30);
    let downloader = with_config(config).await;
    let id = collect_job(&downloader).await;

    let delivery = downloader
        .retrieve_file(id.as_str(), "Song.m4a")
        .await
        .unwrap();
    collect_body(delivery.body).await;
    assert_eq!(downloader.registry.state(&id), Some(JobState::Delivered));
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(downloader.sweep_orphans().await, 1);
    assert!(!downloader.store.workspace_path(&id).exists());
    assert!(downloader.jobs().is_empty());
}

#[tokio::test]
async fn sweep_leaves_fresh_artifacts_alone() {
    let (downloader, _temp) =
        create_test_downloader(ScriptedExtractor::single("Song.m4a", b"audio")).await;
    let id = collect_job(&downloader).await;

    assert_eq!(downloader.sweep_orphans().await, 0);
    assert_eq!(downloader.registry.state(&id), Some(JobState::Ready));
}

#[tokio::test]
async fn sweeper_task_stops_on_shutdown() {
    let (downloader, _temp) =
        create_test_downloader(ScriptedExtractor::single("Song.m4a", b"audio")).await;

    let handle = downloader.start_sweeper();
    downloader.shutdown().await.unwrap();

    let joined =
        tokio_test::assert_ok!(tokio::time::timeout(Duration::from_secs(1), handle).await);
    tokio_test::assert_ok!(joined);
}

#[tokio::test]
async fn jobs_snapshot_tracks_progress() {
    let (downloader, _temp) = create_test_downloader(ScriptedExtractor::new(
        2,
        &[("A.mp3", b"a"), ("B.mp3", b"b")],
    ))
    .await;

    let job = downloader
        .submit("https://example/playlist", AudioFormat::Compatible)
        .await
        .unwrap();
    let id = job.id.clone();
    collect_lines(job).await;

    let jobs = downloader.jobs();
    assert_eq!(jobs.len(), 1);
    let info = &jobs[0];
    assert_eq!(info.id, id.to_string());
    assert_eq!(info.url, "https://example/playlist");
    assert_eq!(info.format, AudioFormat::Compatible);
    assert_eq!(info.enumerated, Some(2));
    assert_eq!(info.files, vec!["A.mp3".to_string(), "B.mp3".to_string()]);
    assert_eq!(info.state, JobState::Ready);
}

async fn collect_job(downloader: &AudioDownloader) -> JobId {
    let job = downloader
        .submit("https://example/single", AudioFormat::Fast)
        .await
        .unwrap();
    let id = job.id.clone();
    collect_lines(job).await;
    id
}

async fn with_config(config: crate::config::Config) -> AudioDownloader {
    let store = Arc::new(crate::workspace::FsWorkspaceStore::new(
        config.workspace.temp_dir.clone(),
        false,
    ));
    AudioDownloader::with_components(
        config,
        store,
        Arc::new(ScriptedExtractor::single("Song.m4a", b"audio")),
    )
    .await
    .unwrap()
}
