//! Response models for the clip file surface.
//!
//! The HTTP surface is intentionally tiny: an informational root, a health
//! payload for monitoring, and the clip byte-stream route. Everything else
//! is not-found.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub downloads_dir: String,
    pub downloads_dir_exists: bool,
    pub file_count: usize,
    /// Current presence line, mirroring what the chat surface displays
    pub presence: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}
