use serde::Deserialize;

use crate::{FrameError, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Completed,
    Failed,
    /// Anything else the server sends (e.g. `started`).
    Other(String),
}

impl ProgressStatus {
    fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "downloading" => ProgressStatus::Downloading,
            "completed" => ProgressStatus::Completed,
            "failed" => ProgressStatus::Failed,
            _ => ProgressStatus::Other(raw.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub task_id: String,
    /// `None` when the server has not resolved the display name yet.
    pub filename: Option<String>,
    /// Clamped to 0..=100.
    pub percentage: u8,
    pub status: ProgressStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub message: String,
}

/// A message received on the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Progress(ProgressEvent),
    Error(ErrorEvent),
}

impl InboundEvent {
    /// Terminal events end the session: `completed`/`failed` progress and
    /// every error event.
    pub fn is_terminal(&self) -> bool {
        match self {
            InboundEvent::Progress(progress) => progress.status.is_terminal(),
            InboundEvent::Error(_) => true,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            InboundEvent::Progress(progress) => Some(&progress.task_id),
            InboundEvent::Error(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireFrame {
    Progress { data: WireProgress },
    Error { message: Option<String> },
}

#[derive(Deserialize)]
struct WireProgress {
    task_id: String,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    percentage: f64,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

const SERVER_ERROR_FALLBACK: &str = "Server reported an error";

/// Parses one text frame. Unknown `type` values and shapes that do not
/// match a known frame are rejected here.
pub fn parse_frame(text: &str) -> Result<InboundEvent, FrameError> {
    let frame: WireFrame =
        serde_json::from_str(text).map_err(|err| FrameError::Json(err.to_string()))?;
    let event = match frame {
        WireFrame::Progress { data } => InboundEvent::Progress(ProgressEvent {
            task_id: data.task_id,
            filename: non_empty(data.filename),
            percentage: clamp_percentage(data.percentage),
            status: ProgressStatus::from_wire(&data.status),
            error_message: non_empty(data.error_message),
        }),
        WireFrame::Error { message } => InboundEvent::Error(ErrorEvent {
            message: non_empty(message).unwrap_or_else(|| SERVER_ERROR_FALLBACK.to_string()),
        }),
    };
    Ok(event)
}

/// Parses a frame received on the channel for `session` and rejects
/// progress that belongs to another task.
pub fn classify_frame(text: &str, session: &SessionId) -> Result<InboundEvent, FrameError> {
    let event = parse_frame(text)?;
    match event.task_id() {
        Some(task_id) if task_id != session.as_str() => Err(FrameError::ForeignTask {
            expected: session.to_string(),
            actual: task_id.to_string(),
        }),
        _ => Ok(event),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn clamp_percentage(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}
