//! `modeldl.ron` loading. A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use modeldl_client::{ClientSettings, DEFAULT_SERVER_URL};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "modeldl.ron";
pub const SERVER_URL_ENV: &str = "MODELDL_SERVER_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid server url {value:?}: {message}")]
    InvalidServerUrl { value: String, message: String },
    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub log_level: String,
    pub log_destination: LogDestination,
    pub stall_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            log_level: "info".to_string(),
            log_destination: LogDestination::default(),
            stall_timeout_secs: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Environment wins over the file for the server origin.
    pub fn with_server_override(mut self, server_url: Option<String>) -> Self {
        if let Some(value) = server_url.filter(|value| !value.trim().is_empty()) {
            self.server_url = value.trim().to_string();
        }
        self
    }

    pub fn level(&self) -> Result<LevelFilter, ConfigError> {
        modeldl_logging::parse_level(&self.log_level)
            .ok_or_else(|| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn client_settings(&self) -> Result<ClientSettings, ConfigError> {
        let server_url =
            Url::parse(&self.server_url).map_err(|err| ConfigError::InvalidServerUrl {
                value: self.server_url.clone(),
                message: err.to_string(),
            })?;
        Ok(ClientSettings {
            stall_timeout: self.stall_timeout_secs.map(Duration::from_secs),
            ..ClientSettings::with_server_url(server_url)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, AppConfig::default());

        let settings = config.client_settings().unwrap();
        assert_eq!(settings.server_url.as_str(), "http://localhost:8000/");
        assert_eq!(settings.stall_timeout, None);
        assert_eq!(config.level().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn reads_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"(
                server_url: "https://models.example.com",
                log_level: "debug",
                log_destination: Both,
                stall_timeout_secs: Some(45),
            )"#,
        );
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.level().unwrap(), LevelFilter::Debug);

        let settings = config.client_settings().unwrap();
        assert_eq!(settings.server_url.host_str(), Some("models.example.com"));
        assert_eq!(settings.stall_timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"(log_level: "warn")"#);
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.log_destination, LogDestination::File);
        assert_eq!(config.level().unwrap(), LevelFilter::Warn);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "(server_url: ");
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn environment_overrides_server_url() {
        let config = AppConfig::default()
            .with_server_override(Some(" http://10.0.0.5:9000 ".to_string()));
        assert_eq!(config.server_url, "http://10.0.0.5:9000");

        let untouched = AppConfig::default().with_server_override(Some("  ".to_string()));
        assert_eq!(untouched.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn bad_values_are_reported() {
        let config = AppConfig {
            server_url: "not a url".to_string(),
            log_level: "loud".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.client_settings(),
            Err(ConfigError::InvalidServerUrl { .. })
        ));
        assert!(matches!(config.level(), Err(ConfigError::InvalidLogLevel(_))));
    }
}
