use crate::{InboundEvent, SessionId, SubmissionError, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted the URL input.
    SubmitRequested(String),
    /// The submission round-trip resolved.
    SubmissionFinished(Result<SessionId, SubmissionError>),
    /// Transport established for the session.
    ChannelOpened { session_id: SessionId },
    /// A well-formed frame arrived on the session's channel.
    ChannelEvent {
        session_id: SessionId,
        event: InboundEvent,
    },
    /// The session's transport failed or closed without a terminal event.
    ChannelFailed {
        session_id: SessionId,
        error: TransportError,
    },
    /// User asked to stop watching the session.
    CancelRequested,
}
