//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ServerConfig;

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Working directory settings
    pub storage: Option<StorageSettings>,
    /// Transcode settings
    pub transcode: Option<TranscodeSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Limits settings
    pub limits: Option<LimitsSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for uploaded input files
    pub upload_dir: Option<String>,
    /// Directory for compressed output files
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeSettings {
    /// AAC bitrate in kbps
    pub bitrate_kbps: Option<u32>,
    /// Apply loudness normalization by default
    pub normalize: Option<bool>,
    /// Normalization target in dBFS
    pub target_dbfs: Option<f64>,
    /// Per-invocation timeout in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Maximum upload size in MB
    pub max_upload_mb: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            storage: Some(StorageSettings {
                upload_dir: Some("static/uploads".to_string()),
                output_dir: Some("static/compressed".to_string()),
            }),
            transcode: Some(TranscodeSettings {
                bitrate_kbps: Some(128),
                normalize: Some(true),
                target_dbfs: Some(-20.0),
                timeout_secs: Some(120),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
            limits: Some(LimitsSettings {
                max_upload_mb: Some(64),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let storage = self.storage.unwrap_or(StorageSettings {
            upload_dir: None,
            output_dir: None,
        });
        let transcode = self.transcode.unwrap_or(TranscodeSettings {
            bitrate_kbps: None,
            normalize: None,
            target_dbfs: None,
            timeout_secs: None,
        });

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            upload_dir: storage.upload_dir.unwrap_or(defaults.upload_dir),
            output_dir: storage.output_dir.unwrap_or(defaults.output_dir),
            transcode: crate::config::TranscodeConfig {
                bitrate_kbps: transcode
                    .bitrate_kbps
                    .unwrap_or(defaults.transcode.bitrate_kbps),
                normalize: transcode.normalize.unwrap_or(defaults.transcode.normalize),
                target_dbfs: transcode
                    .target_dbfs
                    .unwrap_or(defaults.transcode.target_dbfs),
                timeout_secs: transcode
                    .timeout_secs
                    .unwrap_or(defaults.transcode.timeout_secs),
            },
            limits: crate::config::LimitsConfig {
                max_upload_mb: self
                    .limits
                    .and_then(|l| l.max_upload_mb)
                    .unwrap_or(defaults.limits.max_upload_mb),
            },
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: self
                .logging
                .map(|l| l.level)
                .unwrap_or_else(|| "info".to_string()),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
