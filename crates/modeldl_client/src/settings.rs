use std::time::Duration;

use modeldl_core::{SessionId, TransportError};
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

const SUBMIT_PATH: [&str; 2] = ["api", "download"];
const CHANNEL_PATH: [&str; 2] = ["ws", "download"];

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Origin serving both the submission endpoint and the realtime channel.
    pub server_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Fail the session when no frame arrives for this long. `None` waits forever.
    pub stall_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: Url::parse(DEFAULT_SERVER_URL).expect("default server url"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            stall_timeout: None,
        }
    }
}

impl ClientSettings {
    pub fn with_server_url(server_url: Url) -> Self {
        Self {
            server_url,
            ..Self::default()
        }
    }

    /// `POST` target for new download requests.
    pub fn submit_url(&self) -> Option<Url> {
        origin_with_path(&self.server_url, &SUBMIT_PATH)
    }

    /// Channel address for a session: same origin, `ws` or `wss` depending
    /// on whether the server origin is secure.
    pub fn channel_url(&self, session_id: &SessionId) -> Result<Url, TransportError> {
        let mut url = origin_with_path(&self.server_url, &CHANNEL_PATH)
            .ok_or_else(|| TransportError::Connect("server url cannot carry a path".to_string()))?;
        url.path_segments_mut()
            .map_err(|()| TransportError::Connect("server url cannot carry a path".to_string()))?
            .push(session_id.as_str());
        let scheme = match self.server_url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme).map_err(|()| {
            TransportError::Connect(format!("cannot use {scheme} for {}", self.server_url))
        })?;
        Ok(url)
    }
}

fn origin_with_path(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut().ok()?.clear().extend(segments);
    Some(url)
}
