//! Configuration types for audio-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Environment variable holding the listen port
pub const ENV_PORT: &str = "PORT";
/// Environment variable overriding the workspace root
pub const ENV_TEMP_DIR: &str = "AUDIO_DL_TEMP_DIR";
/// Environment variable pointing at the yt-dlp binary
pub const ENV_YT_DLP_PATH: &str = "YT_DLP_PATH";
/// Environment variable pointing at the ffmpeg binary
pub const ENV_FFMPEG_PATH: &str = "FFMPEG_PATH";

/// Per-job scratch space configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceConfig {
    /// Root of all job workspaces and archives (default: "./temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Delete leftover `<token>` directories and `<token>.zip` files at startup (default: true)
    ///
    /// Jobs do not survive a restart, so anything named like a token under the
    /// root is unreachable once the process is gone.
    #[serde(default = "default_true")]
    pub purge_stale_on_startup: bool,

    /// Capacity of each job's progress line channel (default: 64)
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            purge_stale_on_startup: true,
            progress_buffer: default_progress_buffer(),
        }
    }
}

/// External tool paths
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable, passed to yt-dlp for transcoding (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: None,
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Artifact retrieval and cleanup timing
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetrievalConfig {
    /// Delay between the end of a retrieval stream and the purge (default: 1 second)
    ///
    /// Gives the transport a moment to flush. The purge is safe at any time, so
    /// this is not what makes cleanup correct.
    #[serde(default = "default_cleanup_delay", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub cleanup_delay: Duration,

    /// How long a finished artifact waits for retrieval before it is swept (default: 1 hour)
    #[serde(default = "default_orphan_ttl", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub orphan_ttl: Duration,

    /// How often the orphan sweeper runs (default: 60 seconds)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub sweep_interval: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            cleanup_delay: default_cleanup_delay(),
            orphan_ttl: default_orphan_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// Main configuration for AudioDownloader
///
/// Sub-configs are flattened, so the JSON/TOML form has no nesting apart from `api`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Workspace root and progress streaming
    #[serde(flatten)]
    pub workspace: WorkspaceConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Retrieval cleanup and orphan sweeping
    #[serde(flatten)]
    pub retrieval: RetrievalConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Workspace root
    pub fn temp_dir(&self) -> &PathBuf {
        &self.workspace.temp_dir
    }

    /// Build a config from defaults overlaid with process environment variables
    ///
    /// Recognized: `PORT`, `AUDIO_DL_TEMP_DIR`, `YT_DLP_PATH`, `FFMPEG_PATH`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(port) = lookup(ENV_PORT) {
            let port: u16 = port.trim().parse().map_err(|_| Error::Config {
                message: format!("{} must be a port number, got {:?}", ENV_PORT, port),
                key: Some(ENV_PORT.to_string()),
            })?;
            config.server.api.bind_address.set_port(port);
        }
        if let Some(dir) = lookup(ENV_TEMP_DIR).filter(|v| !v.trim().is_empty()) {
            config.workspace.temp_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ENV_YT_DLP_PATH).filter(|v| !v.trim().is_empty()) {
            config.tools.yt_dlp_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(ENV_FFMPEG_PATH).filter(|v| !v.trim().is_empty()) {
            config.tools.ffmpeg_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

// Default value functions
fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_true() -> bool {
    true
}

fn default_progress_buffer() -> usize {
    64
}

fn default_cleanup_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_orphan_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
