//! Audio transcode pipeline
//!
//! This module implements the compress operation:
//! - Input probing via ffprobe (stream layout, sample rate, channels)
//! - Decoding to interleaved 16-bit PCM in memory via ffmpeg
//! - Optional loudness normalization to a target dBFS
//! - AAC/ADTS encoding at a constant bitrate via ffmpeg
//!
//! All external invocations run under a timeout; a hung ffmpeg process is
//! killed rather than stalling the request indefinitely.

pub mod decoder;
pub mod encoder;
pub mod loudness;
pub mod probe;

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

use crate::config::TranscodeConfig;
use crate::error::{CompressError, Result, ToolchainError};
use crate::toolchain::Toolchain;

/// Options for a single compress operation
#[derive(Debug, Clone)]
pub struct TranscodeOptions {
    /// AAC bitrate in kbps
    pub bitrate_kbps: u32,
    /// Apply loudness normalization
    pub normalize: bool,
    /// Normalization target level in dBFS
    pub target_dbfs: f64,
    /// Timeout for each external invocation
    pub timeout: Duration,
}

impl TranscodeOptions {
    /// Build options from the server's transcode configuration
    pub fn from_config(config: &TranscodeConfig) -> Self {
        Self {
            bitrate_kbps: config.bitrate_kbps,
            normalize: config.normalize,
            target_dbfs: config.target_dbfs,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Summary of a completed compress operation
#[derive(Debug, Clone)]
pub struct TranscodeSummary {
    pub channels: u32,
    pub sample_rate: u32,
    pub duration_secs: Option<f64>,
    /// Gain applied during normalization, if any
    pub gain_db: Option<f64>,
    pub output_bytes: u64,
}

/// Decode, optionally normalize, and re-encode an audio file to AAC/ADTS.
///
/// The container and codec of the input are auto-detected by ffmpeg. The
/// output is an AAC elementary stream in an ADTS container at the
/// configured constant bitrate, written to `output`.
pub async fn compress(
    toolchain: &Toolchain,
    options: &TranscodeOptions,
    input: &Path,
    output: &Path,
) -> Result<TranscodeSummary> {
    let info = probe::probe_audio(toolchain, input, options.timeout).await?;
    tracing::debug!(
        codec = %info.codec_name,
        sample_rate = info.sample_rate,
        channels = info.channels,
        "probed input"
    );

    let mut samples = decoder::decode_pcm(toolchain, input, &info, options.timeout).await?;

    let gain_db = if options.normalize {
        let current = loudness::dbfs(&samples);
        if current.is_finite() {
            let gain = options.target_dbfs - current;
            loudness::apply_gain(&mut samples, gain);
            tracing::debug!(
                current_dbfs = current,
                target_dbfs = options.target_dbfs,
                gain_db = gain,
                "applied normalization gain"
            );
            Some(gain)
        } else {
            // Silent input has no measurable level to normalize against.
            tracing::warn!(input = %input.display(), "input is silent, skipping normalization");
            None
        }
    } else {
        None
    };

    encoder::encode_adts(
        toolchain,
        &samples,
        &info,
        options.bitrate_kbps,
        output,
        options.timeout,
    )
    .await?;

    let output_bytes = tokio::fs::metadata(output).await?.len();
    if output_bytes == 0 {
        return Err(CompressError::Encode(
            "encoder produced an empty output file".to_string(),
        ));
    }

    Ok(TranscodeSummary {
        channels: info.channels,
        sample_rate: info.sample_rate,
        duration_secs: info.duration_secs,
        gain_db,
        output_bytes,
    })
}

/// Spawn a toolchain command and wait for it with a timeout.
///
/// The command is configured to be killed when dropped, so a timeout
/// terminates the external process rather than leaking it.
pub(crate) async fn run_tool(
    mut command: Command,
    tool: &'static str,
    timeout: Duration,
) -> Result<std::process::Output> {
    command.kill_on_drop(true);

    let child = command.spawn().map_err(|e| ToolchainError::Spawn {
        tool,
        message: e.to_string(),
    })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ToolchainError::Spawn {
            tool,
            message: e.to_string(),
        }
        .into()),
        Err(_) => Err(CompressError::Timeout {
            secs: timeout.as_secs(),
        }),
    }
}

/// Human-readable failure text for a non-zero toolchain exit
pub(crate) fn failure_text(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = stderr.trim();
    if message.is_empty() {
        format!("exited with {}", output.status)
    } else {
        message.to_string()
    }
}
