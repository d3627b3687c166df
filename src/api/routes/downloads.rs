//! Job submission handler.

use super::DownloadRequest;
use crate::api::AppState;
use crate::error::Error;
use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use std::convert::Infallible;

/// Response header carrying the job token
pub const JOB_ID_HEADER: &str = "x-job-id";

/// POST /download - Start a job and stream its progress
///
/// The body is plain text, one line per step; the last line is always one of
/// `SINGLE_FILE:<token>:<filename>`, `ALL_DONE:<token>` or `FAILED:<token>`.
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Progress stream, one line per step", content_type = "text/plain", body = String),
        (status = 400, description = "Missing or empty url, or malformed body", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(request) = payload?;

    let job = state.downloader.submit(&request.url, request.format).await?;
    tracing::info!(job_id = %job.id, format = %request.format, "download stream opened");

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (header::CACHE_CONTROL, "no-cache".to_string()),
        (HeaderName::from_static(JOB_ID_HEADER), job.id.to_string()),
    ];
    let body = Body::from_stream(job.lines.map(Ok::<_, Infallible>));

    Ok((StatusCode::OK, headers, body).into_response())
}
