use crate::SessionId;

/// Lifecycle of the realtime subscription for the current session.
///
/// `Closed -> Opening -> Open -> Closed`, with `Opening -> Closed` on
/// cancellation. At most one session id is held at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Closed,
    Opening(SessionId),
    Open(SessionId),
}

impl ChannelState {
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            ChannelState::Closed => None,
            ChannelState::Opening(id) | ChannelState::Open(id) => Some(id),
        }
    }

    /// Whether a message tagged with `session_id` may still be folded.
    pub fn accepts(&self, session_id: &SessionId) -> bool {
        self.session_id() == Some(session_id)
    }
}
