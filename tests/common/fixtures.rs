//! Stand-ins for yt-dlp and HTTP helpers

use async_trait::async_trait;
use audio_dl::extraction::{
    AudioExtractor, DownloadReport, Enumeration, ExtractionOptions, ExtractorCapabilities,
};
use axum::body::Body;
use axum::http::{Request, Response};
use std::path::{Path, PathBuf};

/// In-process extractor that writes fixed files
pub struct FakeExtractor {
    pub enumerated: usize,
    pub files: Vec<(String, Vec<u8>)>,
    pub stderr_tail: Option<String>,
}

impl FakeExtractor {
    pub fn new(enumerated: usize, files: &[(&str, &[u8])]) -> Self {
        Self {
            enumerated,
            files: files
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_vec()))
                .collect(),
            stderr_tail: None,
        }
    }
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn enumerate(&self, _url: &str) -> audio_dl::Result<Enumeration> {
        Ok(Enumeration {
            count: self.enumerated,
            title: None,
        })
    }

    async fn download(
        &self,
        _url: &str,
        workspace: &Path,
        _options: &ExtractionOptions,
    ) -> audio_dl::Result<DownloadReport> {
        for (name, data) in &self.files {
            tokio::fs::write(workspace.join(name), data).await?;
        }
        Ok(match &self.stderr_tail {
            Some(tail) => DownloadReport {
                success: false,
                stderr_tail: Some(tail.clone()),
            },
            None => DownloadReport::ok(),
        })
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities {
            can_extract: true,
            can_transcode: false,
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Install an executable shell script standing in for yt-dlp
///
/// The script answers `--dump-single-json` with `metadata_json` and, for a
/// download pass, writes each `(name, content)` pair next to the `-o` template.
#[cfg(unix)]
pub fn install_fake_ytdlp(dir: &Path, metadata_json: &str, files: &[(&str, &str)]) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let mut writes = String::new();
    for (name, content) in files {
        writes.push_str(&format!("printf '%s' '{content}' > \"$dir/{name}\"\n"));
    }

    let script = format!(
        r#"#!/bin/sh
for arg in "$@"; do
  if [ "$arg" = "--dump-single-json" ]; then
    echo '{metadata_json}'
    exit 0
  fi
done
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
dir=$(dirname "$out")
{writes}"#
    );

    let path = dir.join("yt-dlp");
    std::fs::write(&path, script).expect("write fake yt-dlp");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake yt-dlp");
    path
}

pub fn post_download(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/download")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

/// Split a progress body into lines without their newline
pub async fn progress_lines(response: Response<Body>) -> Vec<String> {
    String::from_utf8(body_bytes(response).await)
        .expect("utf-8 progress")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Wait until `condition` holds, polling briefly
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}
