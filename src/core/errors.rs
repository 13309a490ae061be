// src/core/errors.rs

//! Defines the primary error type for the policy engine's internal,
//! recoverable failure paths. Process-boundary glue (`main`, startup)
//! uses `anyhow::Result` instead, matching the split used throughout.

use thiserror::Error;

/// Soft-failure error type for the engine's internals. None of these
/// variants are fatal to the decision loop; callers log and fall back
/// to stale state per the error-handling design.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("moderation executor failed: {0}")]
    ModerationExecutor(String),

    #[error("input line was not valid JSON: {0}")]
    MalformedInput(String),
}

impl From<reqwest::Error> for GateError {
    fn from(e: reqwest::Error) -> Self {
        GateError::HttpClientError(e.to_string())
    }
}
