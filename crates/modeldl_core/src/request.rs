use std::fmt;

use url::Url;

use crate::ValidationError;

/// Opaque token handed out by the submission endpoint (`task_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user's request to download one remote model.
///
/// Surrounding whitespace is dropped on construction; the value is never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim().to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Checks emptiness first, then URI syntax. Never touches the network.
    pub fn validate(&self) -> Result<Url, ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingUrl);
        }
        Url::parse(&self.url).map_err(|err| ValidationError::InvalidUrl(err.to_string()))
    }
}
