//! Upload filename policy and per-request working directories
//!
//! Uploaded filenames are client-controlled and must never escape the
//! working directories. Each request gets its own UUID-named subdirectory
//! under both the upload and output directories, so concurrent uploads of
//! identically named files cannot collide. The scope removes both
//! directories when dropped, covering every handler exit path.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::ALLOWED_EXTENSIONS;
use crate::error::Result;

/// Suffix appended to the input stem to form the output filename
const OUTPUT_SUFFIX: &str = "_compressed.aac";

/// Check whether a filename carries an allowed audio extension.
///
/// The check is case-insensitive and considers only the substring after
/// the final dot. A name without a dot is rejected.
pub fn allowed_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

/// Sanitize a client-supplied filename.
///
/// Strips any path components, then maps every character outside
/// `[A-Za-z0-9._-]` to `_`. Names that sanitize to nothing usable fall
/// back to `"upload"`.
pub fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // A name of only dots or underscores carries no information and
    // would produce pathological paths like ".." downstream.
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.' || c == '_') {
        "upload".to_string()
    } else {
        sanitized
    }
}

/// Derive the download filename: strip the final extension, append
/// `_compressed.aac`.
pub fn output_filename(input_name: &str) -> String {
    let stem = match input_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => input_name,
    };
    format!("{}{}", stem, OUTPUT_SUFFIX)
}

/// Per-request working directories.
///
/// Creates `<upload_dir>/<request_id>/` and `<output_dir>/<request_id>/`
/// on construction and removes both (best effort) on drop.
pub struct RequestScope {
    request_id: Uuid,
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl RequestScope {
    /// Create the request-scoped directories under the configured roots
    pub fn create(upload_root: &Path, output_root: &Path) -> Result<Self> {
        let request_id = Uuid::new_v4();
        let upload_dir = upload_root.join(request_id.to_string());
        let output_dir = output_root.join(request_id.to_string());

        std::fs::create_dir_all(&upload_dir)?;
        std::fs::create_dir_all(&output_dir)?;

        Ok(Self {
            request_id,
            upload_dir,
            output_dir,
        })
    }

    /// Unique identifier for this request
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Path for the stored upload with the given (sanitized) filename
    pub fn input_path(&self, filename: &str) -> PathBuf {
        self.upload_dir.join(filename)
    }

    /// Path for the compressed output with the given filename
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        for dir in [&self.upload_dir, &self.output_dir] {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        request_id = %self.request_id,
                        dir = %dir.display(),
                        "failed to clean up request directory: {}",
                        e
                    );
                }
            }
        }
    }
}
