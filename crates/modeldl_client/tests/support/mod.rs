#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use modeldl_client::SessionInitiator;
use modeldl_core::{DownloadRequest, SessionId, SubmissionError};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use url::Url;

pub const MODEL_URL: &str = "https://civitai.com/models/12345/test-model";

pub fn init_logging() {
    modeldl_logging::initialize_for_tests();
}

/// Fails the test instead of hanging when `future` never resolves.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

pub fn progress_frame(task_id: &str, percentage: u8, filename: &str, status: &str) -> String {
    serde_json::json!({
        "type": "progress",
        "data": {
            "task_id": task_id,
            "filename": filename,
            "percentage": percentage,
            "status": status,
        }
    })
    .to_string()
}

pub fn error_frame(message: &str) -> String {
    serde_json::json!({ "type": "error", "message": message }).to_string()
}

/// What the channel server does after sending its frames.
#[derive(Debug, Clone, Copy)]
pub enum Finish {
    /// Keep the connection until the client closes it.
    Hold,
    /// Drop the TCP stream without a close handshake.
    Drop,
}

#[derive(Debug)]
pub struct ServerReport {
    pub path: String,
    pub client_closed: bool,
}

/// Local realtime channel: sends the same frames on every connection.
pub struct ChannelServer {
    pub url: Url,
    reports: mpsc::UnboundedReceiver<ServerReport>,
}

impl ChannelServer {
    pub async fn start(frames: Vec<String>, finish: Finish) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (report_tx, reports) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let frames = frames.clone();
                let report_tx = report_tx.clone();
                tokio::spawn(async move {
                    let mut path = String::new();
                    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                        path = req.uri().path().to_string();
                        Ok(resp)
                    };
                    let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                        .await
                        .unwrap();
                    for frame in frames {
                        if ws.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    let client_closed = match finish {
                        Finish::Hold => wait_for_client_close(&mut ws).await,
                        Finish::Drop => {
                            drop(ws);
                            false
                        }
                    };
                    let _ = report_tx.send(ServerReport {
                        path,
                        client_closed,
                    });
                });
            }
        });

        Self {
            url: Url::parse(&format!("http://{addr}")).unwrap(),
            reports,
        }
    }

    pub async fn next_report(&mut self) -> ServerReport {
        within(self.reports.recv()).await.expect("server report")
    }
}

async fn wait_for_client_close<S>(ws: &mut WebSocketStream<S>) -> bool
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Close(_)) => return true,
            Ok(_) => continue,
            Err(_) => return false,
        }
    }
    false
}

/// An address nothing listens on.
pub async fn unused_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}")).unwrap()
}

/// Accepts connections but never answers the upgrade request.
pub async fn silent_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

/// Initiator that answers from a canned result and counts network-bound calls.
pub struct StubInitiator {
    result: Result<SessionId, SubmissionError>,
    calls: AtomicUsize,
}

impl StubInitiator {
    pub fn accepting(task_id: &str) -> Arc<Self> {
        Self::answering(Ok(SessionId::new(task_id)))
    }

    pub fn answering(result: Result<SessionId, SubmissionError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionInitiator for StubInitiator {
    async fn submit(&self, request: &DownloadRequest) -> Result<SessionId, SubmissionError> {
        request.validate()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
