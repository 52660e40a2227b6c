use std::time::Duration;

use thiserror::Error;

/// Errors returned by BFL API operations.
#[derive(Error, Debug)]
pub enum BflError {
    /// The API key was missing or rejected (HTTP 401).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The account has run out of credits (HTTP 402).
    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    /// Too many concurrent requests (HTTP 429). Carries the server's
    /// Retry-After value in seconds.
    #[error("Rate limited: {message} (retry after {retry_after}s)")]
    RateLimit { message: String, retry_after: u64 },

    /// Request parameters were rejected, either locally before any network
    /// call or by the server with HTTP 400.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The server reported the generation job itself as failed.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Timed out polling for the job to reach a terminal state.
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    /// Any other non-success status from the API, with the server-provided
    /// error code and message.
    #[error("BFL API returned HTTP {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The response was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file I/O failure while saving a downloaded image.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BflError {
    /// Classify a non-200 HTTP status into an error kind.
    ///
    /// `code` and `message` are the server's `error` and `message` body
    /// fields (or the raw body text when it is not JSON). `retry_after` is
    /// the parsed Retry-After header, used only for 429.
    pub fn from_status(status: u16, code: &str, message: &str, retry_after: u64) -> Self {
        match status {
            401 => BflError::Authentication(message.to_string()),
            402 => BflError::InsufficientCredits(message.to_string()),
            429 => BflError::RateLimit {
                message: message.to_string(),
                retry_after,
            },
            400 => BflError::Validation(message.to_string()),
            _ => BflError::Api {
                status,
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BflError>;
