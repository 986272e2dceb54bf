//! Input probing via ffprobe
//!
//! Runs `ffprobe -print_format json` against the uploaded file and picks
//! the first audio stream. Probe failure here means the input is corrupt
//! or not actually audio, regardless of what its extension claimed.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{CompressError, Result};
use crate::toolchain::Toolchain;

use super::{failure_text, run_tool};

/// Parameters of the input's audio stream
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub codec_name: String,
    pub sample_rate: u32,
    pub channels: u32,
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    // ffprobe emits sample_rate as a JSON string
    sample_rate: Option<String>,
    channels: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probe an input file and return its first audio stream's parameters
pub async fn probe_audio(
    toolchain: &Toolchain,
    input: &Path,
    timeout: Duration,
) -> Result<AudioInfo> {
    let mut command = Command::new(&toolchain.ffprobe);
    command
        .arg("-v")
        .arg("error")
        .arg("-print_format")
        .arg("json")
        .arg("-show_streams")
        .arg("-show_format")
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = run_tool(command, "ffprobe", timeout).await?;
    if !output.status.success() {
        return Err(CompressError::Probe(failure_text(&output)));
    }

    let json = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(&json)
}

/// Parse ffprobe JSON output into [`AudioInfo`]
fn parse_probe_output(json: &str) -> Result<AudioInfo> {
    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| CompressError::Probe(e.to_string()))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .ok_or(CompressError::NoAudioStream)?;

    let sample_rate = stream
        .sample_rate
        .as_deref()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&rate| rate > 0)
        .ok_or_else(|| CompressError::Probe("missing or invalid sample rate".to_string()))?;

    let channels = stream.channels.filter(|&c| c > 0).unwrap_or(1);

    let duration_secs = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok());

    Ok(AudioInfo {
        codec_name: stream
            .codec_name
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        sample_rate,
        channels,
        duration_secs,
    })
}
