use std::collections::VecDeque;
use std::sync::Arc;

use modeldl_core::{
    update, DownloadRequest, DownloadViewModel, Effect, Msg, SessionMachine, SessionState,
    ValidationError,
};
use modeldl_logging::{dl_debug, dl_info, dl_warn};
use tokio::sync::{mpsc, watch};

use crate::{ChannelManager, ClientSettings, ReqwestInitiator, SessionInitiator};

/// The presentation boundary: read the current snapshot, `submit` a URL,
/// `cancel` the running session. Nothing else mutates session state.
///
/// All messages are folded on the caller's task, one at a time and in
/// arrival order.
pub struct DownloadSession {
    machine: SessionMachine,
    initiator: Arc<dyn SessionInitiator>,
    channels: ChannelManager,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    snapshot_tx: watch::Sender<SessionState>,
}

impl DownloadSession {
    pub fn new(settings: ClientSettings) -> Self {
        let initiator = Arc::new(ReqwestInitiator::new(settings.clone()));
        Self::with_initiator(settings, initiator)
    }

    pub fn with_initiator(settings: ClientSettings, initiator: Arc<dyn SessionInitiator>) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(SessionState::new());
        Self {
            machine: SessionMachine::new(),
            initiator,
            channels: ChannelManager::new(settings, msg_tx),
            msg_rx,
            snapshot_tx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.machine.snapshot().clone()
    }

    pub fn view(&self) -> DownloadViewModel {
        self.machine.view()
    }

    /// Receives every new snapshot, each one whole.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshot_tx.subscribe()
    }

    /// Validates and submits `url`, waiting for the submission round-trip.
    ///
    /// Validation problems come back as `Err` and leave the session
    /// untouched; server and network failures fold into a failed snapshot.
    /// Ignored while another session is still active.
    pub async fn submit(&mut self, url: &str) -> Result<(), ValidationError> {
        let effects = self.dispatch(Msg::SubmitRequested(url.to_string()));
        if effects.is_empty() {
            return match self.machine.field_error() {
                Some(err) => Err(err.clone()),
                None => {
                    dl_debug!("Submit ignored while a session is active");
                    Ok(())
                }
            };
        }
        self.run_effects(effects).await;
        Ok(())
    }

    /// Stops watching the current session. Nothing received afterwards for
    /// it is folded, including messages already queued.
    pub fn cancel(&mut self) {
        let effects = self.dispatch(Msg::CancelRequested);
        for effect in effects {
            if let Some(request) = self.apply_channel_effect(effect) {
                dl_warn!("Unexpected submit on cancel url_len={}", request.url().len());
            }
        }
    }

    /// Waits for the next snapshot change caused by the channel.
    ///
    /// Returns `None` once no channel is active and nothing is queued.
    pub async fn next_update(&mut self) -> Option<SessionState> {
        loop {
            if self.channels.active_session().is_none() && self.msg_rx.is_empty() {
                return None;
            }
            let msg = self.msg_rx.recv().await?;
            let before = self.machine.snapshot().clone();
            let effects = self.dispatch(msg);
            self.run_effects(effects).await;
            if self.machine.snapshot() != &before {
                return Some(self.state());
            }
        }
    }

    /// Folds channel messages until the session settles, then returns the
    /// final snapshot.
    pub async fn run_to_completion(&mut self) -> SessionState {
        while self.next_update().await.is_some() {}
        self.state()
    }

    /// Closes any transport and waits until it has been released.
    pub async fn shutdown(&mut self) {
        self.channels.shutdown().await;
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let machine = std::mem::take(&mut self.machine);
        let previous_phase = machine.snapshot().phase();
        let (mut machine, effects) = update(machine, msg);
        if machine.consume_dirty() {
            let next = machine.snapshot().clone();
            if next.phase() != previous_phase && next.phase().is_terminal() {
                dl_info!(
                    "Session reached {:?} percentage={} error={:?}",
                    next.phase(),
                    next.percentage(),
                    next.error_message()
                );
            }
            self.snapshot_tx.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });
        }
        self.machine = machine;
        effects
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            let Some(request) = self.apply_channel_effect(effect) else {
                continue;
            };
            let result = self.initiator.submit(&request).await;
            match &result {
                Ok(session_id) => dl_info!("Session started session={}", session_id),
                Err(err) => dl_warn!("Submission failed: {}", err),
            }
            queue.extend(self.dispatch(Msg::SubmissionFinished(result)));
        }
    }

    /// Runs channel effects in place; hands a submit back to the caller.
    fn apply_channel_effect(&mut self, effect: Effect) -> Option<DownloadRequest> {
        match effect {
            Effect::Submit { request } => Some(request),
            Effect::OpenChannel { session_id } => {
                self.channels.open(session_id);
                None
            }
            Effect::CloseChannel { session_id } => {
                self.channels.close_session(&session_id);
                None
            }
        }
    }
}
