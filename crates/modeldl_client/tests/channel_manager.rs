use std::time::Duration;

use modeldl_client::{ChannelManager, ClientSettings};
use modeldl_core::{InboundEvent, Msg, SessionId, TransportError};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

mod support;
use support::{
    init_logging, progress_frame, silent_url, unused_url, within, ChannelServer, Finish,
};

#[tokio::test]
async fn opening_second_session_closes_first() {
    init_logging();
    let mut server = ChannelServer::start(Vec::new(), Finish::Hold).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut manager = ChannelManager::new(ClientSettings::with_server_url(server.url.clone()), tx);

    manager.open(SessionId::new("one"));
    assert_eq!(
        within(rx.recv()).await,
        Some(Msg::ChannelOpened {
            session_id: SessionId::new("one")
        })
    );

    manager.open(SessionId::new("two"));
    assert_eq!(manager.active_session(), Some(&SessionId::new("two")));

    let first = server.next_report().await;
    assert_eq!(first.path, "/ws/download/one");
    assert!(first.client_closed);

    assert_eq!(
        within(rx.recv()).await,
        Some(Msg::ChannelOpened {
            session_id: SessionId::new("two")
        })
    );

    manager.shutdown().await;
    let second = server.next_report().await;
    assert_eq!(second.path, "/ws/download/two");
    assert!(second.client_closed);
    assert_eq!(manager.active_session(), None);
}

#[tokio::test]
async fn close_is_idempotent() {
    init_logging();
    let mut server = ChannelServer::start(Vec::new(), Finish::Hold).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut manager = ChannelManager::new(ClientSettings::with_server_url(server.url.clone()), tx);

    manager.open(SessionId::new("abc"));
    within(rx.recv()).await;

    assert!(manager.close());
    assert!(!manager.close());
    assert!(!manager.close_session(&SessionId::new("abc")));
    assert!(server.next_report().await.client_closed);
}

#[tokio::test]
async fn close_session_ignores_other_ids() {
    init_logging();
    let server = ChannelServer::start(Vec::new(), Finish::Hold).await;
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut manager = ChannelManager::new(ClientSettings::with_server_url(server.url.clone()), tx);

    manager.open(SessionId::new("abc"));
    assert!(!manager.close_session(&SessionId::new("other")));
    assert_eq!(manager.active_session(), Some(&SessionId::new("abc")));
    manager.shutdown().await;
}

#[tokio::test]
async fn malformed_and_foreign_frames_are_dropped() {
    init_logging();
    let frames = vec![
        "garbage".to_string(),
        r#"{"type":"heartbeat"}"#.to_string(),
        progress_frame("someone-else", 90, "", "downloading"),
        progress_frame("abc", 5, "", "downloading"),
        progress_frame("abc", 100, "m.safetensors", "completed"),
    ];
    let mut server = ChannelServer::start(frames, Finish::Hold).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut manager = ChannelManager::new(ClientSettings::with_server_url(server.url.clone()), tx);

    manager.open(SessionId::new("abc"));
    let mut percentages = Vec::new();
    loop {
        match within(rx.recv()).await.expect("message") {
            Msg::ChannelOpened { .. } => {}
            Msg::ChannelEvent {
                event: InboundEvent::Progress(progress),
                ..
            } => {
                let done = progress.status.is_terminal();
                percentages.push(progress.percentage);
                if done {
                    break;
                }
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
    assert_eq!(percentages, vec![5, 100]);

    // The reader closes the transport itself after a terminal frame.
    assert!(server.next_report().await.client_closed);
    manager.shutdown().await;
}

#[tokio::test]
async fn connect_failure_is_reported() {
    init_logging();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut manager = ChannelManager::new(ClientSettings::with_server_url(unused_url().await), tx);

    manager.open(SessionId::new("abc"));
    match within(rx.recv()).await {
        Some(Msg::ChannelFailed {
            session_id,
            error: TransportError::Connect(_),
        }) => assert_eq!(session_id, SessionId::new("abc")),
        other => panic!("unexpected message {other:?}"),
    }
    manager.shutdown().await;
}

#[tokio::test]
async fn unanswered_handshake_reports_stall() {
    init_logging();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let settings = ClientSettings {
        stall_timeout: Some(Duration::from_millis(150)),
        ..ClientSettings::with_server_url(silent_url().await)
    };
    let mut manager = ChannelManager::new(settings, tx);

    manager.open(SessionId::new("abc"));
    assert_eq!(
        within(rx.recv()).await,
        Some(Msg::ChannelFailed {
            session_id: SessionId::new("abc"),
            error: TransportError::Stalled(Duration::from_millis(150)),
        })
    );
    manager.shutdown().await;
}
