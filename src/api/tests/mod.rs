use super::*;
use crate::downloader::test_helpers::ScriptedExtractor;
use crate::error::ApiError;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Router over a test downloader backed by `extractor`
async fn test_app(
    extractor: ScriptedExtractor,
) -> (Router, Arc<AudioDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) =
        crate::downloader::test_helpers::create_test_downloader(extractor).await;
    let downloader = Arc::new(downloader);
    let app = create_router(downloader.clone(), downloader.get_config());
    (app, downloader, temp_dir)
}

fn post_download(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/download")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

async fn api_error(response: Response<Body>) -> ApiError {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Run POST /download to the end and return the progress lines
async fn run_download(app: &Router, body: &str) -> Vec<String> {
    let response = app.clone().oneshot(post_download(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_text(response)
        .await
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn server_binds_and_stops_on_shutdown_signal() {
    let (_app, downloader, _temp_dir) =
        test_app(ScriptedExtractor::single("Song.m4a", b"audio")).await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server_with_shutdown(
        downloader,
        config,
        async move {
            stop_rx.await.ok();
        },
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok(), "server failed: {result:?}");
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (_app, downloader, _temp_dir) =
        test_app(ScriptedExtractor::single("Song.m4a", b"audio")).await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn cors_headers_absent_when_disabled() {
    let (_app, downloader, _temp_dir) =
        test_app(ScriptedExtractor::single("Song.m4a", b"audio")).await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[test]
fn cors_layer_accepts_explicit_origin_list() {
    // Invalid header values are skipped rather than rejected
    let _layer = build_cors_layer(&[
        "http://localhost:3000".to_string(),
        "bad\norigin".to_string(),
    ]);
}
