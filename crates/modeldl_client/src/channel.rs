use std::time::Duration;

use futures_util::StreamExt;
use modeldl_core::{classify_frame, Msg, SessionId, TransportError};
use modeldl_logging::{dl_debug, dl_error, dl_info, dl_trace, dl_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::ClientSettings;

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

struct ActiveChannel {
    session_id: SessionId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the realtime transport for at most one session at a time.
///
/// Frames are parsed and scoped to the session on the reader task, then
/// forwarded in arrival order as [`Msg`]s. Malformed frames are logged and
/// dropped there.
pub struct ChannelManager {
    settings: ClientSettings,
    msg_tx: mpsc::UnboundedSender<Msg>,
    active: Option<ActiveChannel>,
    closing: Vec<JoinHandle<()>>,
}

impl ChannelManager {
    pub fn new(settings: ClientSettings, msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            settings,
            msg_tx,
            active: None,
            closing: Vec::new(),
        }
    }

    pub fn active_session(&self) -> Option<&SessionId> {
        self.active.as_ref().map(|active| &active.session_id)
    }

    /// Starts connecting for `session_id` and returns immediately. Any
    /// channel that is still opening or open is closed first.
    pub fn open(&mut self, session_id: SessionId) {
        self.close();
        self.closing.retain(|task| !task.is_finished());

        let url = match self.settings.channel_url(&session_id) {
            Ok(url) => url,
            Err(error) => {
                dl_warn!("No channel url session={} err={}", session_id, error);
                let _ = self.msg_tx.send(Msg::ChannelFailed { session_id, error });
                return;
            }
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_channel(
            url,
            session_id.clone(),
            self.settings.stall_timeout,
            self.msg_tx.clone(),
            cancel.clone(),
        ));
        self.active = Some(ActiveChannel {
            session_id,
            cancel,
            task,
        });
    }

    /// Closes the active channel. Returns `false` when nothing was open.
    pub fn close(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                dl_debug!("Closing channel session={}", active.session_id);
                active.cancel.cancel();
                self.closing.push(active.task);
                true
            }
            None => false,
        }
    }

    /// Closes the active channel only if it belongs to `session_id`.
    pub fn close_session(&mut self, session_id: &SessionId) -> bool {
        if self.active_session() == Some(session_id) {
            self.close()
        } else {
            false
        }
    }

    /// Closes everything and waits until each transport has been released.
    pub async fn shutdown(&mut self) {
        self.close();
        for task in self.closing.drain(..) {
            if let Err(err) = task.await {
                dl_error!("Channel task ended abnormally: {}", err);
            }
        }
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        self.close();
    }
}

enum PumpExit {
    Cancelled,
    Terminal,
    Failed(TransportError),
}

async fn run_channel(
    url: Url,
    session_id: SessionId,
    stall_timeout: Option<Duration>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    cancel: CancellationToken,
) {
    dl_info!("Opening channel session={} url={}", session_id, url);

    let mut socket = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            dl_debug!("Channel cancelled before it opened session={}", session_id);
            return;
        }
        result = connect(&url, stall_timeout) => match result {
            Ok(socket) => socket,
            Err(error) => {
                dl_warn!("Channel connect failed session={} err={}", session_id, error);
                let _ = msg_tx.send(Msg::ChannelFailed { session_id, error });
                return;
            }
        },
    };

    // Cancelled while the handshake completed: release without reporting.
    if cancel.is_cancelled() {
        close_socket(&mut socket, &session_id).await;
        return;
    }

    let _ = msg_tx.send(Msg::ChannelOpened {
        session_id: session_id.clone(),
    });

    let exit = pump(&mut socket, &session_id, stall_timeout, &msg_tx, &cancel).await;
    close_socket(&mut socket, &session_id).await;

    match exit {
        PumpExit::Cancelled => dl_debug!("Channel cancelled session={}", session_id),
        PumpExit::Terminal => dl_info!("Channel finished session={}", session_id),
        PumpExit::Failed(error) => {
            dl_warn!("Channel failed session={} err={}", session_id, error);
            let _ = msg_tx.send(Msg::ChannelFailed { session_id, error });
        }
    }
}

/// The stall window also bounds the upgrade handshake.
async fn connect(url: &Url, stall_timeout: Option<Duration>) -> Result<Socket, TransportError> {
    let handshake = tokio_tungstenite::connect_async(url.as_str());
    let result = match stall_timeout {
        Some(window) => tokio::time::timeout(window, handshake)
            .await
            .map_err(|_| TransportError::Stalled(window))?,
        None => handshake.await,
    };
    result
        .map(|(socket, _response)| socket)
        .map_err(|err| TransportError::Connect(err.to_string()))
}

async fn pump(
    socket: &mut Socket,
    session_id: &SessionId,
    stall_timeout: Option<Duration>,
    msg_tx: &mpsc::UnboundedSender<Msg>,
    cancel: &CancellationToken,
) -> PumpExit {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PumpExit::Cancelled,
            next = next_message(socket, stall_timeout) => next,
        };

        let message = match next {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(err))) => return PumpExit::Failed(TransportError::Protocol(err.to_string())),
            Ok(None) => return PumpExit::Failed(TransportError::ClosedUnexpectedly),
            Err(window) => return PumpExit::Failed(TransportError::Stalled(window)),
        };

        match message {
            Message::Text(text) => match classify_frame(&text, session_id) {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    let _ = msg_tx.send(Msg::ChannelEvent {
                        session_id: session_id.clone(),
                        event,
                    });
                    if terminal {
                        return PumpExit::Terminal;
                    }
                }
                Err(err) => {
                    dl_warn!("Dropping frame session={} err={}", session_id, err);
                }
            },
            Message::Close(frame) => {
                dl_debug!("Server closed channel session={} frame={:?}", session_id, frame);
                return PumpExit::Failed(TransportError::ClosedUnexpectedly);
            }
            Message::Binary(bytes) => {
                dl_warn!("Dropping binary frame session={} len={}", session_id, bytes.len());
            }
            other => dl_trace!("Ignoring control frame session={} {:?}", session_id, other),
        }
    }
}

async fn next_message(
    socket: &mut Socket,
    stall_timeout: Option<Duration>,
) -> Result<Option<Result<Message, tokio_tungstenite::tungstenite::Error>>, Duration> {
    match stall_timeout {
        Some(window) => tokio::time::timeout(window, socket.next())
            .await
            .map_err(|_| window),
        None => Ok(socket.next().await),
    }
}

async fn close_socket(socket: &mut Socket, session_id: &SessionId) {
    if let Err(err) = socket.close(None).await {
        dl_debug!("Channel close handshake failed session={} err={}", session_id, err);
    }
}
