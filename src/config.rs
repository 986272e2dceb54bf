//! Server configuration

use serde::{Deserialize, Serialize};

/// File extensions accepted by the compress endpoint (case-insensitive)
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac"];

/// Transcode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// AAC bitrate in kbps
    pub bitrate_kbps: u32,

    /// Apply loudness normalization by default
    pub normalize: bool,

    /// Normalization target level in dBFS
    pub target_dbfs: f64,

    /// Maximum wall-clock time for a single external invocation in seconds
    pub timeout_secs: u64,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            bitrate_kbps: 128,
            normalize: true,
            target_dbfs: -20.0,
            timeout_secs: 120,
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_upload_mb: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_upload_mb: 64 }
    }
}

impl LimitsConfig {
    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory for uploaded input files
    pub upload_dir: String,

    /// Directory for compressed output files
    pub output_dir: String,

    /// Transcode configuration
    pub transcode: TranscodeConfig,

    /// Request limits
    pub limits: LimitsConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            upload_dir: "static/uploads".to_string(),
            output_dir: "static/compressed".to_string(),
            transcode: TranscodeConfig::default(),
            limits: LimitsConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string for binding
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
