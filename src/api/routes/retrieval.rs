//! One-shot artifact delivery handlers.

use crate::api::AppState;
use crate::downloader::{ARCHIVE_DOWNLOAD_NAME, Delivery};
use crate::error::Error;
use crate::utils::content_disposition;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// GET /get_file/:token/:filename - Deliver a single-file artifact once
#[utoipa::path(
    get,
    path = "/get_file/{token}/{filename}",
    tag = "retrieval",
    params(
        ("token" = String, Path, description = "Job token from the SINGLE_FILE marker"),
        ("filename" = String, Path, description = "Filename from the SINGLE_FILE marker")
    ),
    responses(
        (status = 200, description = "Audio file bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed token", body = crate::error::ApiError),
        (status = 404, description = "Unknown, already delivered or wrong filename", body = crate::error::ApiError)
    )
)]
pub async fn get_file(
    State(state): State<AppState>,
    Path((token, filename)): Path<(String, String)>,
) -> Result<Response, Error> {
    let delivery = state.downloader.retrieve_file(&token, &filename).await?;
    let disposition = content_disposition(&delivery.download_name);
    Ok(delivery_response(delivery, disposition))
}

/// GET /get_zip/:token - Deliver an archive artifact once
#[utoipa::path(
    get,
    path = "/get_zip/{token}",
    tag = "retrieval",
    params(
        ("token" = String, Path, description = "Job token from the ALL_DONE marker")
    ),
    responses(
        (status = 200, description = "Zip archive bytes", content_type = "application/zip"),
        (status = 400, description = "Malformed token", body = crate::error::ApiError),
        (status = 404, description = "Unknown or already delivered", body = crate::error::ApiError)
    )
)]
pub async fn get_zip(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, Error> {
    let delivery = state.downloader.retrieve_archive(&token).await?;
    let disposition = format!("attachment; filename={ARCHIVE_DOWNLOAD_NAME}");
    Ok(delivery_response(delivery, disposition))
}

fn delivery_response(delivery: Delivery, disposition: String) -> Response {
    tracing::info!(
        job_id = %delivery.id,
        name = %delivery.download_name,
        bytes = delivery.content_length,
        "delivering artifact"
    );

    let headers = [
        (header::CONTENT_TYPE, delivery.content_type.to_string()),
        (header::CONTENT_LENGTH, delivery.content_length.to_string()),
        (header::CONTENT_DISPOSITION, disposition),
        (header::CACHE_CONTROL, "no-store".to_string()),
    ];

    (StatusCode::OK, headers, Body::from_stream(delivery.body)).into_response()
}
