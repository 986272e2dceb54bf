//! External FFmpeg toolchain resolution
//!
//! The service delegates all decoding and encoding to the `ffmpeg` and
//! `ffprobe` executables. Both are resolved from PATH once at startup;
//! a missing executable is a fatal startup error. The resolved paths are
//! carried in [`Toolchain`] and passed explicitly into the transcode
//! operation rather than read from any global state.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::ToolchainError;

/// Resolved paths to the external encoder and prober
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Toolchain {
    /// Resolve both executables from the process PATH.
    ///
    /// Called once at application startup. Returns an error if either
    /// executable cannot be found; the server must refuse to start in
    /// that case.
    pub fn resolve() -> Result<Self, ToolchainError> {
        let ffmpeg = find_executable("ffmpeg").ok_or(ToolchainError::NotFound("ffmpeg"))?;
        let ffprobe = find_executable("ffprobe").ok_or(ToolchainError::NotFound("ffprobe"))?;

        Ok(Self { ffmpeg, ffprobe })
    }

    /// Get FFmpeg version information (first line of `ffmpeg -version`)
    pub async fn version_info(&self) -> String {
        let output = tokio::process::Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) => String::from_utf8_lossy(&out.stdout)
                .lines()
                .next()
                .unwrap_or("unknown")
                .to_string(),
            Err(_) => "unknown".to_string(),
        }
    }
}

/// Search PATH for an executable by name
fn find_executable(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;

    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let candidate = dir.join(format!("{}.exe", name));
            if is_executable_file(&candidate) {
                return Some(candidate);
            }
        }
    }

    None
}

fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
