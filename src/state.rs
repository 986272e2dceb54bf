//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration
//! - Resolved FFmpeg toolchain paths
//! - In-flight transcode job bookkeeping

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::toolchain::Toolchain;

/// Information about an in-flight transcode job
#[derive(Debug, Clone)]
pub struct JobInfo {
    /// Sanitized filename of the uploaded input
    pub filename: String,
    /// Unix timestamp (seconds) when the job started
    pub started_at: u64,
}

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Resolved external toolchain paths
    pub toolchain: Toolchain,

    /// In-flight transcode jobs (request_id -> JobInfo)
    pub active_jobs: DashMap<Uuid, JobInfo>,

    /// Total jobs completed successfully since startup
    jobs_completed: AtomicU64,

    /// Total jobs failed since startup
    jobs_failed: AtomicU64,

    /// Server start time (unix seconds)
    started_at: u64,
}

impl AppState {
    /// Create a new AppState with the given configuration and toolchain
    pub fn new(config: ServerConfig, toolchain: Toolchain) -> Self {
        Self {
            config,
            toolchain,
            active_jobs: DashMap::new(),
            jobs_completed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            started_at: unix_now(),
        }
    }

    /// Create the upload and output working directories if absent
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.upload_dir())?;
        std::fs::create_dir_all(self.output_dir())?;
        Ok(())
    }

    /// Base directory for uploaded input files
    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.upload_dir)
    }

    /// Base directory for compressed output files
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.output_dir)
    }

    /// Record the start of a transcode job
    pub fn begin_job(&self, request_id: Uuid, filename: &str) {
        self.active_jobs.insert(
            request_id,
            JobInfo {
                filename: filename.to_string(),
                started_at: unix_now(),
            },
        );
    }

    /// Record the end of a transcode job
    pub fn finish_job(&self, request_id: Uuid, success: bool) {
        self.active_jobs.remove(&request_id);
        if success {
            self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of jobs completed since startup
    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    /// Number of jobs failed since startup
    pub fn jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Server uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        unix_now().saturating_sub(self.started_at)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
