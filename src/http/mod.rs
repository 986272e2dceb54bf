//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the upload/compress endpoints
//! - Multipart upload handling and validation
//! - Health, version and debug endpoints
//! - CORS and request tracing middleware

pub mod handlers;
pub mod routes;

pub use routes::create_router;
