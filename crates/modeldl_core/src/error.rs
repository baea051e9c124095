use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Input problems caught before any network call. The display text is the
/// field-level message shown next to the URL input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL is required")]
    MissingUrl,
    #[error("Invalid URL format")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("URL is required")]
    MissingUrl,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("server rejected the download request with HTTP {status}")]
    ServerRejected { status: u16, body: String },
    #[error("server unreachable: {0}")]
    Unreachable(String),
    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),
}

impl From<ValidationError> for SubmissionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingUrl => SubmissionError::MissingUrl,
            ValidationError::InvalidUrl(detail) => SubmissionError::InvalidUrl(detail),
        }
    }
}

#[derive(Deserialize)]
struct RejectionBody {
    error: Option<String>,
    detail: Option<serde_json::Value>,
}

impl SubmissionError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SubmissionError::MissingUrl | SubmissionError::InvalidUrl(_)
        )
    }

    /// Message shown on the failed session.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::MissingUrl => "URL is required".to_string(),
            SubmissionError::InvalidUrl(_) => "Invalid URL format".to_string(),
            SubmissionError::ServerRejected { status, body } => {
                rejection_message(body).unwrap_or_else(|| format!("HTTP {status}"))
            }
            SubmissionError::Unreachable(detail) => format!("Failed to start download: {detail}"),
            SubmissionError::InvalidResponse(_) => "Unexpected response from server".to_string(),
        }
    }
}

// Accepts `{"error": "..."}` and `{"detail": "..."}` bodies.
fn rejection_message(body: &str) -> Option<String> {
    let parsed: RejectionBody = serde_json::from_str(body).ok()?;
    let detail = match parsed.detail {
        Some(serde_json::Value::String(text)) => Some(text),
        _ => None,
    };
    parsed
        .error
        .or(detail)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Failures of the realtime channel itself, as opposed to errors the
/// server reports through the channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("could not open channel: {0}")]
    Connect(String),
    #[error("channel protocol error: {0}")]
    Protocol(String),
    #[error("channel closed before the download finished")]
    ClosedUnexpectedly,
    #[error("no message received for {0:?}")]
    Stalled(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Json(String),
    #[error("frame for task {actual} on channel for task {expected}")]
    ForeignTask { expected: String, actual: String },
}
