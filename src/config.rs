//! Runtime configuration, read from environment variables with defaults.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;

/// Configuration for the client core.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash.
    pub api_url: String,
    /// Directory holding the local session database.
    pub data_dir: PathBuf,
    /// Cadence of the backend liveness probe.
    pub health_interval: Duration,
}

impl ClientConfig {
    /// Build a configuration from `PROSPECTOR_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let api_url = std::env::var("PROSPECTOR_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let data_dir = std::env::var("PROSPECTOR_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("prospector")
            });

        let health_interval = std::env::var("PROSPECTOR_HEALTH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS));

        Self::new(api_url, data_dir, health_interval)
    }

    pub fn new(api_url: impl Into<String>, data_dir: PathBuf, health_interval: Duration) -> Self {
        let mut api_url = api_url.into();
        while api_url.ends_with('/') {
            api_url.pop();
        }
        Self {
            api_url,
            data_dir,
            health_interval,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_API_URL,
            PathBuf::from("."),
            Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS),
        )
    }
}
