//! HTTP bodies shared by both agents (besides the A2A types).

use serde::{Deserialize, Serialize};

/// `POST /api/echo` body. A missing message is treated like an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body for 4xx/5xx responses: `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// `GET /api/health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub framework: String,
    pub version: String,
    pub timestamp: String,
    /// "enabled" when a completion backend is wired up, else "disabled".
    pub semantic_kernel: String,
    pub a2a_protocol: String,
}
