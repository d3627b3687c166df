//! OpenAPI documentation and schema generation
//!
//! The document is generated at compile time by utoipa from the handler
//! annotations in [`crate::api::routes`].

use utoipa::OpenApi;

/// OpenAPI documentation for the audio-dl REST API
///
/// Served at:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "audio-dl REST API",
        version = "0.1.0",
        description = "Streams yt-dlp audio extraction progress and delivers each result exactly once",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Jobs
        crate::api::routes::start_download,

        // Retrieval
        crate::api::routes::get_file,
        crate::api::routes::get_zip,

        // System
        crate::api::routes::health_check,
        crate::api::routes::get_capabilities,
        crate::api::routes::list_jobs,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::AudioFormat,
        crate::types::JobState,
        crate::types::Artifact,
        crate::types::PackagingOutcome,
        crate::types::JobSummary,
        crate::types::Capabilities,

        crate::config::Config,
        crate::config::WorkspaceConfig,
        crate::config::ToolsConfig,
        crate::config::RetrievalConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        crate::api::routes::DownloadRequest,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "downloads", description = "Start a job and read its progress stream"),
        (name = "retrieval", description = "One-shot delivery of finished artifacts"),
        (name = "system", description = "Health, capabilities, job diagnostics, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
