//! PCM decoding via ffmpeg
//!
//! Decodes the uploaded file to interleaved signed 16-bit little-endian
//! PCM, collected in memory so the loudness stage can measure and scale
//! the samples before re-encoding.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{CompressError, Result};
use crate::toolchain::Toolchain;

use super::probe::AudioInfo;
use super::{failure_text, run_tool};

/// Decode an input file to interleaved i16 PCM at its native sample rate
/// and channel count.
pub async fn decode_pcm(
    toolchain: &Toolchain,
    input: &Path,
    info: &AudioInfo,
    timeout: Duration,
) -> Result<Vec<i16>> {
    let mut command = Command::new(&toolchain.ffmpeg);
    command
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-f")
        .arg("s16le")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg(info.sample_rate.to_string())
        .arg("-ac")
        .arg(info.channels.to_string())
        .arg("pipe:1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = run_tool(command, "ffmpeg", timeout).await?;
    if !output.status.success() {
        return Err(CompressError::Decode(failure_text(&output)));
    }
    if output.stdout.is_empty() {
        return Err(CompressError::Decode(
            "decoder produced no samples".to_string(),
        ));
    }

    Ok(bytes_to_samples(&output.stdout))
}

/// Reinterpret little-endian s16le bytes as samples. A trailing odd byte
/// (truncated stream) is dropped.
pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
