use crate::{
    ErrorEvent, InboundEvent, Phase, ProgressEvent, ProgressStatus, SessionId, SessionState,
    SubmissionError, TransportError,
};

/// Shown for every transport-level failure; the cause is connectivity,
/// not anything the server said.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error";

/// Used when the server marks a task failed without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Download failed";

/// Everything that can move a session snapshot forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Submitted(Result<SessionId, SubmissionError>),
    Event(InboundEvent),
    TransportFailed(TransportError),
    Cancelled,
}

/// Pure fold: applies one input to the previous snapshot.
///
/// Submission results and cancellation start over from a fresh snapshot.
/// Once a session is terminal, channel inputs leave it unchanged.
pub fn project(previous: &SessionState, input: &SessionInput) -> SessionState {
    match input {
        SessionInput::Submitted(Ok(session_id)) => SessionState {
            phase: Phase::Connecting,
            session_id: Some(session_id.clone()),
            ..SessionState::default()
        },
        SessionInput::Submitted(Err(err)) => SessionState {
            phase: Phase::Failed,
            error_message: Some(err.user_message()),
            ..SessionState::default()
        },
        SessionInput::Cancelled => SessionState::default(),
        _ if previous.phase.is_terminal() => previous.clone(),
        SessionInput::Event(InboundEvent::Progress(progress)) => fold_progress(previous, progress),
        SessionInput::Event(InboundEvent::Error(ErrorEvent { message })) => {
            failed(previous, previous.filename.clone(), message.clone())
        }
        SessionInput::TransportFailed(_) => failed(
            previous,
            previous.filename.clone(),
            CONNECTION_ERROR_MESSAGE.to_string(),
        ),
    }
}

fn fold_progress(previous: &SessionState, progress: &ProgressEvent) -> SessionState {
    let filename = progress
        .filename
        .clone()
        .unwrap_or_else(|| previous.filename.clone());

    match &progress.status {
        ProgressStatus::Completed => SessionState {
            phase: Phase::Completed,
            percentage: 100,
            filename,
            error_message: None,
            session_id: previous.session_id.clone(),
        },
        ProgressStatus::Failed => {
            let message = progress
                .error_message
                .clone()
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            failed(previous, filename, message)
        }
        ProgressStatus::Downloading | ProgressStatus::Other(_) => SessionState {
            phase: Phase::InProgress,
            // Never lower within one channel lifetime; new sessions start at 0.
            percentage: progress.percentage.max(previous.percentage),
            filename,
            error_message: None,
            session_id: previous.session_id.clone(),
        },
    }
}

fn failed(previous: &SessionState, filename: String, message: String) -> SessionState {
    SessionState {
        phase: Phase::Failed,
        percentage: previous.percentage,
        filename,
        error_message: Some(message),
        session_id: previous.session_id.clone(),
    }
}
