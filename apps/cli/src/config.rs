//! CLI configuration.
//!
//! Read from `<config dir>/ahavault/config.json`; every field is optional.
//! `AHAVAULT_API_URL` overrides the file, and `--api-url` overrides both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use ahavault_protocol::constants::{DEFAULT_API_URL, REQUEST_TIMEOUT};
use ahavault_transfer::DEFAULT_CHUNK_SIZE;

/// Environment variable overriding [`CliConfig::api_url`].
pub const API_URL_ENV: &str = "AHAVAULT_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// API base URL, `/api` suffix included.
    pub api_url: String,
    /// tus PATCH size in bytes.
    pub chunk_size: usize,
    pub request_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl CliConfig {
    /// Loads the config file (if any) and applies the environment override.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_api_url(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Reads `path`. A missing file yields the defaults; an unparsable one
    /// is logged and ignored.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse CLI config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Replaces the API URL unless `url` is blank.
    pub fn apply_api_url(&mut self, url: Option<String>) {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.api_url = url;
        }
    }

    /// Request timeout; zero falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_secs == 0 {
            REQUEST_TIMEOUT
        } else {
            Duration::from_secs(self.request_timeout_secs)
        }
    }
}

/// `<config dir>/ahavault/config.json`.
pub fn config_path() -> Option<PathBuf> {
    ahavault_session::config_dir().map(|d| d.join("ahavault").join("config.json"))
}
