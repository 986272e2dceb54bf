//! Audio compression service
//!
//! An HTTP service that accepts an uploaded audio file, transcodes it to
//! an AAC/ADTS stream via the external FFmpeg toolchain with optional
//! loudness normalization, and returns the result as a download.

mod config;
mod config_file;
mod error;
mod http;
mod integration;
mod state;
mod toolchain;
mod transcode;
mod upload;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::http::create_router;
use crate::state::AppState;
use crate::toolchain::Toolchain;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "audio-compressor";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    tracing::info!("{} v{} starting", APP_NAME, VERSION);

    // Resolve the external toolchain. Missing executables are fatal: the
    // server must not accept requests it cannot serve.
    let toolchain = match Toolchain::resolve() {
        Ok(toolchain) => toolchain,
        Err(e) => {
            tracing::error!("{}. Install FFmpeg and ensure it is on PATH.", e);
            return Err(e.into());
        }
    };
    tracing::info!("Toolchain: {}", toolchain.version_info().await);
    tracing::info!(
        "ffmpeg: {}, ffprobe: {}",
        toolchain.ffmpeg.display(),
        toolchain.ffprobe.display()
    );

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        match crate::config_file::ConfigFile::from_file(&config_path) {
            Ok(cf) => cf.into_server_config(),
            Err(e) => {
                tracing::warn!(
                    "Failed to load config file {}: {}. Using defaults.",
                    config_path,
                    e
                );
                ServerConfig::default()
            }
        }
    } else {
        ServerConfig::default()
    };
    tracing::info!("Configuration loaded: {:?}", config);

    // Create application state and working directories
    let state = Arc::new(AppState::new(config.clone(), toolchain));
    state.ensure_directories()?;

    // Build router
    let app = create_router(state.clone());

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| crate::error::CompressError::Config(format!("invalid bind address: {}", e)))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(crate::error::CompressError::Io)?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audio_compressor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
