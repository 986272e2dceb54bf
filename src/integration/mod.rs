//! Integration tests
//!
//! End-to-end tests exercising the router with in-memory requests, plus
//! fixtures for generating audio test files. The full transcode tests
//! require FFmpeg on PATH and skip themselves when it is absent.

#[cfg(test)]
pub mod e2e;
