//! HTTP request handlers
//!
//! Implements the landing page, the compress endpoint, and the service
//! endpoints (health, version, debug).

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;

use crate::error::CompressError;
use crate::state::AppState;
use crate::transcode::{self, TranscodeOptions};
use crate::upload::{self, RequestScope};

/// Landing page with the upload form
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Audio Compressor</title>
</head>
<body>
  <h1>Audio Compressor</h1>
  <p>Upload an audio file (mp3, wav, ogg, flac, aac) to compress it to AAC.</p>
  <form action="/compress" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".mp3,.wav,.ogg,.flac,.aac">
    <label><input type="checkbox" name="normalize" value="true" checked> Normalize loudness</label>
    <button type="submit">Compress</button>
  </form>
</body>
</html>
"#;

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    /// Multipart body carried no `file` field
    MissingFilePart,
    /// The `file` field carried an empty filename
    EmptySelection,
    /// Filename extension outside the allow-set
    InvalidFormat,
    /// Malformed request (multipart parse error, bad field value)
    BadRequest(String),
    /// Transcode pipeline failure
    Transcode(String),
    /// External process exceeded the configured timeout
    Timeout(u64),
    /// Everything else
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::MissingFilePart => (StatusCode::BAD_REQUEST, "No file part".to_string()),
            HttpError::EmptySelection => (StatusCode::BAD_REQUEST, "No selected file".to_string()),
            HttpError::InvalidFormat => {
                (StatusCode::BAD_REQUEST, "Invalid file format".to_string())
            }
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Transcode(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An error occurred while compressing the audio file: {}", msg),
            ),
            HttpError::Timeout(secs) => (
                StatusCode::GATEWAY_TIMEOUT,
                format!(
                    "An error occurred while compressing the audio file: transcode timed out after {}s",
                    secs
                ),
            ),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, body).into_response()
    }
}

impl From<CompressError> for HttpError {
    fn from(err: CompressError) -> Self {
        match err {
            CompressError::Timeout { secs } => HttpError::Timeout(secs),
            CompressError::Io(e) => HttpError::Internal(e.to_string()),
            other => HttpError::Transcode(other.to_string()),
        }
    }
}

fn internal<E: std::fmt::Display>(err: E) -> HttpError {
    HttpError::Internal(err.to_string())
}

/// Landing page endpoint
/// GET /
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("audio-compressor v", env!("CARGO_PKG_VERSION"))
}

/// Debug endpoint listing in-flight transcode jobs
/// GET /debug/jobs
pub async fn active_jobs(State(state): State<Arc<AppState>>) -> Response {
    let jobs: Vec<serde_json::Value> = state
        .active_jobs
        .iter()
        .map(|entry| {
            json!({
                "request_id": entry.key().to_string(),
                "filename": entry.value().filename,
                "started_at": entry.value().started_at,
            })
        })
        .collect();

    Json(json!({
        "active": jobs,
        "completed": state.jobs_completed(),
        "failed": state.jobs_failed(),
        "uptime_secs": state.uptime_secs(),
    }))
    .into_response()
}

/// Compress endpoint
/// POST /compress (multipart, field `file`, optional field `normalize`)
pub async fn compress_audio(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, HttpError> {
    let mut upload_part: Option<(String, Bytes)> = None;
    let mut normalize_override: Option<bool> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::BadRequest(e.to_string()))?;
                upload_part = Some((filename, data));
            }
            Some("normalize") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| HttpError::BadRequest(e.to_string()))?;
                normalize_override = Some(parse_bool_field(&value)?);
            }
            _ => {}
        }
    }

    let (original_name, data) = upload_part.ok_or(HttpError::MissingFilePart)?;
    if original_name.is_empty() {
        return Err(HttpError::EmptySelection);
    }
    if !upload::allowed_extension(&original_name) {
        return Err(HttpError::InvalidFormat);
    }

    let filename = upload::sanitize_filename(&original_name);
    let download_name = upload::output_filename(&filename);

    // Request-scoped directories; removed when `scope` drops, on every
    // exit path below.
    let scope = RequestScope::create(&state.upload_dir(), &state.output_dir()).map_err(internal)?;
    let request_id = scope.request_id();

    let input_path = scope.input_path(&filename);
    tokio::fs::write(&input_path, &data)
        .await
        .map_err(internal)?;
    let output_path = scope.output_path(&download_name);

    let mut options = TranscodeOptions::from_config(&state.config.transcode);
    if let Some(normalize) = normalize_override {
        options.normalize = normalize;
    }

    tracing::info!(
        request_id = %request_id,
        filename = %filename,
        bytes = data.len(),
        normalize = options.normalize,
        "compress request"
    );
    state.begin_job(request_id, &filename);

    let summary =
        match transcode::compress(&state.toolchain, &options, &input_path, &output_path).await {
            Ok(summary) => {
                state.finish_job(request_id, true);
                summary
            }
            Err(err) => {
                state.finish_job(request_id, false);
                tracing::warn!(request_id = %request_id, "transcode failed: {}", err);
                return Err(HttpError::from(err));
            }
        };

    tracing::info!(
        request_id = %request_id,
        output_bytes = summary.output_bytes,
        gain_db = ?summary.gain_db,
        duration_secs = ?summary.duration_secs,
        "compress complete"
    );

    let body = tokio::fs::read(&output_path).await.map_err(internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/aac"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", download_name))
            .map_err(internal)?,
    );

    Ok((headers, Bytes::from(body)).into_response())
}

fn parse_bool_field(value: &str) -> Result<bool, HttpError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(HttpError::BadRequest(format!(
            "invalid normalize value: {}",
            other
        ))),
    }
}
