use crate::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Connecting,
    InProgress,
    Completed,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }

    /// A session exists and has not reached a terminal phase.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Connecting | Phase::InProgress)
    }
}

/// Immutable snapshot of one download session.
///
/// Only [`crate::project`] builds new snapshots; every fold yields a whole
/// replacement value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub(crate) phase: Phase,
    pub(crate) percentage: u8,
    pub(crate) filename: String,
    pub(crate) error_message: Option<String>,
    pub(crate) session_id: Option<SessionId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Present only while `phase() == Phase::Failed`.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }
}
