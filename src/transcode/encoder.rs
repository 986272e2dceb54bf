//! AAC/ADTS encoding via ffmpeg
//!
//! Feeds the (possibly gain-adjusted) PCM buffer to ffmpeg over stdin and
//! writes an AAC elementary stream in an ADTS container at a constant
//! bitrate. PCM is written from a separate task so stderr can be drained
//! concurrently without deadlocking on full pipes.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{CompressError, Result, ToolchainError};
use crate::toolchain::Toolchain;

use super::probe::AudioInfo;
use super::failure_text;

/// Encode an i16 PCM buffer to an AAC/ADTS file at the given bitrate
pub async fn encode_adts(
    toolchain: &Toolchain,
    samples: &[i16],
    info: &AudioInfo,
    bitrate_kbps: u32,
    output: &Path,
    timeout: Duration,
) -> Result<()> {
    let pcm = samples_to_bytes(samples);

    let mut command = Command::new(&toolchain.ffmpeg);
    command
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-f")
        .arg("s16le")
        .arg("-ar")
        .arg(info.sample_rate.to_string())
        .arg("-ac")
        .arg(info.channels.to_string())
        .arg("-i")
        .arg("pipe:0")
        .arg("-c:a")
        .arg("aac")
        .arg("-b:a")
        .arg(format!("{}k", bitrate_kbps))
        .arg("-f")
        .arg("adts")
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| ToolchainError::Spawn {
        tool: "ffmpeg",
        message: e.to_string(),
    })?;

    let mut stdin = child.stdin.take().ok_or(ToolchainError::Spawn {
        tool: "ffmpeg",
        message: "failed to open encoder stdin".to_string(),
    })?;

    // A write error here usually means the encoder died early; the exit
    // status below carries the real diagnostic.
    let writer = tokio::spawn(async move {
        let _ = stdin.write_all(&pcm).await;
        let _ = stdin.shutdown().await;
    });

    let result = tokio::time::timeout(timeout, child.wait_with_output()).await;
    writer.abort();

    let output_info = match result {
        Ok(Ok(out)) => out,
        Ok(Err(e)) => {
            return Err(ToolchainError::Spawn {
                tool: "ffmpeg",
                message: e.to_string(),
            }
            .into())
        }
        Err(_) => {
            return Err(CompressError::Timeout {
                secs: timeout.as_secs(),
            })
        }
    };

    if !output_info.status.success() {
        return Err(CompressError::Encode(failure_text(&output_info)));
    }

    Ok(())
}

/// Serialize samples as little-endian s16le bytes
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}
