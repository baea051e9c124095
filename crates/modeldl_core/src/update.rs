use crate::{
    project, ChannelState, DownloadRequest, DownloadViewModel, Effect, Msg, SessionInput,
    SessionState, ValidationError,
};

/// Everything the session controller tracks between messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionMachine {
    snapshot: SessionState,
    channel: ChannelState,
    field_error: Option<ValidationError>,
    submitting: bool,
    dirty: bool,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &SessionState {
        &self.snapshot
    }

    pub fn channel(&self) -> &ChannelState {
        &self.channel
    }

    pub fn field_error(&self) -> Option<&ValidationError> {
        self.field_error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn view(&self) -> DownloadViewModel {
        DownloadViewModel::from_machine(self)
    }

    /// Returns whether anything changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn apply(&mut self, input: &SessionInput) {
        let next = project(&self.snapshot, input);
        if next != self.snapshot {
            self.snapshot = next;
            self.dirty = true;
        }
    }

    fn close_channel(&mut self) -> Vec<Effect> {
        match std::mem::take(&mut self.channel) {
            ChannelState::Closed => Vec::new(),
            ChannelState::Opening(session_id) | ChannelState::Open(session_id) => {
                self.dirty = true;
                vec![Effect::CloseChannel { session_id }]
            }
        }
    }
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionMachine, msg: Msg) -> (SessionMachine, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitRequested(raw) => {
            if state.submitting || state.snapshot.phase().is_active() {
                return (state, Vec::new());
            }
            let request = DownloadRequest::new(raw);
            state.dirty = true;
            match request.validate() {
                Ok(_) => {
                    state.field_error = None;
                    state.submitting = true;
                    vec![Effect::Submit { request }]
                }
                Err(err) => {
                    state.field_error = Some(err);
                    Vec::new()
                }
            }
        }
        Msg::SubmissionFinished(result) => {
            if !state.submitting {
                return (state, Vec::new());
            }
            state.submitting = false;
            state.dirty = true;
            // Normally already closed: submits are refused while a channel is
            // active and terminal folds close it. Kept so OpenChannel always
            // follows a close of any previous channel.
            let mut effects = state.close_channel();
            let opened = result.as_ref().ok().cloned();
            state.apply(&SessionInput::Submitted(result));
            if let Some(session_id) = opened {
                state.channel = ChannelState::Opening(session_id.clone());
                effects.push(Effect::OpenChannel { session_id });
            }
            effects
        }
        Msg::ChannelOpened { session_id } => {
            if state.channel == ChannelState::Opening(session_id.clone()) {
                state.channel = ChannelState::Open(session_id);
                state.dirty = true;
            }
            Vec::new()
        }
        Msg::ChannelEvent { session_id, event } => {
            if !state.channel.accepts(&session_id) {
                return (state, Vec::new());
            }
            if let ChannelState::Opening(id) = &state.channel {
                state.channel = ChannelState::Open(id.clone());
            }
            state.apply(&SessionInput::Event(event));
            if state.snapshot.phase().is_terminal() {
                state.close_channel()
            } else {
                Vec::new()
            }
        }
        Msg::ChannelFailed { session_id, error } => {
            if !state.channel.accepts(&session_id) {
                return (state, Vec::new());
            }
            state.apply(&SessionInput::TransportFailed(error));
            state.close_channel()
        }
        Msg::CancelRequested => {
            let effects = state.close_channel();
            if state.snapshot.phase().is_active() {
                state.apply(&SessionInput::Cancelled);
            }
            effects
        }
    };

    (state, effects)
}
