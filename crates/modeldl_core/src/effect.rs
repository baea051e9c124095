use crate::{DownloadRequest, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the request to the submission endpoint.
    Submit { request: DownloadRequest },
    /// Register a channel for the session; returns without waiting.
    OpenChannel { session_id: SessionId },
    /// Actively close the session's transport.
    CloseChannel { session_id: SessionId },
}
