//! End-to-end integration tests
//!
//! Drives the router with in-memory requests via `tower::ServiceExt`.
//! Tests that run the real transcode pipeline resolve FFmpeg first and
//! skip when it is not installed on the host.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::util::ServiceExt;

use crate::config::ServerConfig;
use crate::http::create_router;
use crate::integration::fixtures;
use crate::state::AppState;
use crate::toolchain::Toolchain;

/// Router backed by temp working directories and a dummy toolchain.
/// Good for everything that fails before the transcode step.
fn validation_app() -> (Router, tempfile::TempDir) {
    let toolchain = Toolchain {
        ffmpeg: PathBuf::from("ffmpeg"),
        ffprobe: PathBuf::from("ffprobe"),
    };
    build_app(toolchain)
}

/// Router with the real toolchain, or None when FFmpeg is absent
fn transcode_app() -> Option<(Router, tempfile::TempDir)> {
    let toolchain = Toolchain::resolve().ok()?;
    Some(build_app(toolchain))
}

fn build_app(toolchain: Toolchain) -> (Router, tempfile::TempDir) {
    let root = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        upload_dir: root.path().join("uploads").to_string_lossy().to_string(),
        output_dir: root.path().join("compressed").to_string_lossy().to_string(),
        ..ServerConfig::default()
    };

    let state = Arc::new(AppState::new(config, toolchain));
    state.ensure_directories().unwrap();
    (create_router(state), root)
}

async fn post_multipart(app: Router, body: Vec<u8>) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri("/compress")
        .header(header::CONTENT_TYPE, fixtures::multipart_content_type())
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn dir_entry_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_index_page() {
    let (app, _root) = validation_app();

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("<form"));
    assert!(body.contains("/compress"));
}

#[tokio::test]
async fn test_missing_file_part() {
    let (app, _root) = validation_app();

    let body = fixtures::multipart_text("normalize", "true");
    let response = post_multipart(app, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, b"No file part");
}

#[tokio::test]
async fn test_empty_filename() {
    let (app, _root) = validation_app();

    let body = fixtures::multipart_file("", "audio/wav", b"data");
    let response = post_multipart(app, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, b"No selected file");
}

#[tokio::test]
async fn test_invalid_file_format() {
    let (app, root) = validation_app();

    let body = fixtures::multipart_file("malware.exe", "application/x-dosexec", b"MZ");
    let response = post_multipart(app, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, b"Invalid file format");

    // Rejected uploads must leave nothing in either working directory
    assert_eq!(dir_entry_count(&root.path().join("uploads")), 0);
    assert_eq!(dir_entry_count(&root.path().join("compressed")), 0);
}

#[tokio::test]
async fn test_extension_checked_after_final_dot() {
    let (app, _root) = validation_app();

    // Allowed set checked on the substring after the final dot only
    let body = fixtures::multipart_file("track.MP3.bak", "audio/mpeg", b"data");
    let response = post_multipart(app, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, b"Invalid file format");
}

#[tokio::test]
async fn test_compress_round_trip() {
    let Some((app, root)) = transcode_app() else {
        eprintln!("FFmpeg not found, skipping");
        return;
    };

    let wav = fixtures::sample_wav();
    let body = fixtures::multipart_file("sample.wav", "audio/wav", &wav);
    let response = post_multipart(app, body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap(),
        "attachment; filename=\"sample_compressed.aac\""
    );
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/aac"
    );

    let aac = body_bytes(response).await;
    assert!(!aac.is_empty());
    assert!(fixtures::is_adts(&aac), "body is not an ADTS stream");

    // Per-request workspaces cleaned up on success
    assert_eq!(dir_entry_count(&root.path().join("uploads")), 0);
    assert_eq!(dir_entry_count(&root.path().join("compressed")), 0);
}

#[tokio::test]
async fn test_compress_is_repeatable() {
    let Some((app, _root)) = transcode_app() else {
        eprintln!("FFmpeg not found, skipping");
        return;
    };

    let wav = fixtures::sample_wav();
    for _ in 0..2 {
        let body = fixtures::multipart_file("sample.wav", "audio/wav", &wav);
        let response = post_multipart(app.clone(), body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let aac = body_bytes(response).await;
        assert!(fixtures::is_adts(&aac));
    }
}

#[tokio::test]
async fn test_concurrent_same_filename() {
    let Some((app, root)) = transcode_app() else {
        eprintln!("FFmpeg not found, skipping");
        return;
    };

    let wav = fixtures::sample_wav();
    let body_a = fixtures::multipart_file("sample.wav", "audio/wav", &wav);
    let body_b = fixtures::multipart_file("sample.wav", "audio/wav", &wav);

    let (res_a, res_b) = tokio::join!(
        post_multipart(app.clone(), body_a),
        post_multipart(app, body_b)
    );

    assert_eq!(res_a.status(), StatusCode::OK);
    assert_eq!(res_b.status(), StatusCode::OK);
    assert!(fixtures::is_adts(&body_bytes(res_a).await));
    assert!(fixtures::is_adts(&body_bytes(res_b).await));

    // Both request scopes cleaned up independently
    assert_eq!(dir_entry_count(&root.path().join("uploads")), 0);
    assert_eq!(dir_entry_count(&root.path().join("compressed")), 0);
}

#[tokio::test]
async fn test_corrupt_input_reports_error() {
    let Some((app, root)) = transcode_app() else {
        eprintln!("FFmpeg not found, skipping");
        return;
    };

    // Extension passes the allow-set; content is not decodable
    let body = fixtures::multipart_file("garbage.mp3", "audio/mpeg", &[0u8; 256]);
    let response = post_multipart(app, body).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(
        text.starts_with("An error occurred while compressing the audio file:"),
        "unexpected body: {}",
        text
    );

    // Failed requests clean up too
    assert_eq!(dir_entry_count(&root.path().join("uploads")), 0);
    assert_eq!(dir_entry_count(&root.path().join("compressed")), 0);
}

#[tokio::test]
async fn test_normalization_hits_target_level() {
    let Some(toolchain) = Toolchain::resolve().ok() else {
        eprintln!("FFmpeg not found, skipping");
        return;
    };

    use crate::transcode::{self, decoder, loudness, probe, TranscodeOptions};
    use std::time::Duration;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("tone_compressed.aac");
    std::fs::write(&input, fixtures::sample_wav()).unwrap();

    let options = TranscodeOptions {
        bitrate_kbps: 128,
        normalize: true,
        target_dbfs: -20.0,
        timeout: Duration::from_secs(60),
    };

    let summary = transcode::compress(&toolchain, &options, &input, &output)
        .await
        .unwrap();
    assert!(summary.gain_db.is_some());
    assert_eq!(summary.channels, 1);

    // Decode the AAC output and verify its measured level. Lossy coding
    // and encoder priming shift the RMS slightly, hence the tolerance.
    let info = probe::probe_audio(&toolchain, &output, Duration::from_secs(60))
        .await
        .unwrap();
    let samples = decoder::decode_pcm(&toolchain, &output, &info, Duration::from_secs(60))
        .await
        .unwrap();
    let level = loudness::dbfs(&samples);

    assert!(
        (level - (-20.0)).abs() < 1.0,
        "expected ~-20 dBFS, got {}",
        level
    );
}

#[tokio::test]
async fn test_silent_input_skips_normalization() {
    let Some(toolchain) = Toolchain::resolve().ok() else {
        eprintln!("FFmpeg not found, skipping");
        return;
    };

    use crate::transcode::{self, TranscodeOptions};
    use std::time::Duration;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("silence.wav");
    let output = dir.path().join("silence_compressed.aac");

    // Zero-amplitude input has dBFS of negative infinity; there is no
    // level to normalize against, so the gain stage must be skipped and
    // the encode must still succeed.
    let samples = fixtures::sine_wave(440.0, 16000, 5.0, 0.0);
    std::fs::write(&input, fixtures::wav_bytes(&samples, 16000, 1)).unwrap();

    let options = TranscodeOptions {
        bitrate_kbps: 128,
        normalize: true,
        target_dbfs: -20.0,
        timeout: Duration::from_secs(60),
    };

    let summary = transcode::compress(&toolchain, &options, &input, &output)
        .await
        .unwrap();

    assert!(summary.gain_db.is_none());
    assert!(summary.output_bytes > 0);
    let aac = std::fs::read(&output).unwrap();
    assert!(fixtures::is_adts(&aac));
}

#[tokio::test]
async fn test_normalize_field_disables_gain() {
    let Some(toolchain) = Toolchain::resolve().ok() else {
        eprintln!("FFmpeg not found, skipping");
        return;
    };

    use crate::transcode::{self, TranscodeOptions};
    use std::time::Duration;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("tone_compressed.aac");
    std::fs::write(&input, fixtures::sample_wav()).unwrap();

    let options = TranscodeOptions {
        bitrate_kbps: 128,
        normalize: false,
        target_dbfs: -20.0,
        timeout: Duration::from_secs(60),
    };

    let summary = transcode::compress(&toolchain, &options, &input, &output)
        .await
        .unwrap();
    assert!(summary.gain_db.is_none());
    assert!(summary.output_bytes > 0);
}
