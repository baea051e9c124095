use modeldl_core::{DownloadRequest, SessionId, SubmissionError};
use modeldl_logging::{dl_info, dl_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::ClientSettings;

/// Sends one download request and hands back the server's session id.
///
/// Implementations validate the request before any network action and
/// never retry.
#[async_trait::async_trait]
pub trait SessionInitiator: Send + Sync {
    async fn submit(&self, request: &DownloadRequest) -> Result<SessionId, SubmissionError>;
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestInitiator {
    settings: ClientSettings,
}

impl ReqwestInitiator {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, SubmissionError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| SubmissionError::Unreachable(err.to_string()))
    }
}

#[async_trait::async_trait]
impl SessionInitiator for ReqwestInitiator {
    async fn submit(&self, request: &DownloadRequest) -> Result<SessionId, SubmissionError> {
        let parsed = request.validate()?;
        let endpoint = self.settings.submit_url().ok_or_else(|| {
            SubmissionError::Unreachable(format!(
                "no submission endpoint for {}",
                self.settings.server_url
            ))
        })?;
        dl_info!(
            "Submitting download host={} url_len={}",
            parsed.host_str().unwrap_or_default(),
            request.url().len()
        );

        let body = serde_json::to_vec(&SubmitBody { url: request.url() })
            .map_err(|err| SubmissionError::InvalidResponse(err.to_string()))?;
        let client = self.build_client()?;
        let response = client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| SubmissionError::Unreachable(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| SubmissionError::Unreachable(err.to_string()))?;

        if !status.is_success() {
            dl_warn!("Submission rejected status={} body_len={}", status.as_u16(), text.len());
            return Err(SubmissionError::ServerRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: SubmitResponse = serde_json::from_str(&text)
            .map_err(|err| SubmissionError::InvalidResponse(err.to_string()))?;
        let task_id = parsed.task_id.trim();
        if task_id.is_empty() {
            return Err(SubmissionError::InvalidResponse("empty task_id".to_string()));
        }

        dl_info!("Submission accepted task_id={}", task_id);
        Ok(SessionId::new(task_id))
    }
}
