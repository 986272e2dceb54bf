use thiserror::Error;

/// Main error type for the compression service
#[derive(Error, Debug)]
pub enum CompressError {
    #[error("toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to probe input: {0}")]
    Probe(String),

    #[error("no audio stream found in input file")]
    NoAudioStream,

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("transcode timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from the external FFmpeg toolchain
#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("{0} not found on PATH")]
    NotFound(&'static str),

    #[error("failed to spawn {tool}: {message}")]
    Spawn { tool: &'static str, message: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CompressError>;
