use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::constants::*;
use crate::data::location::UpdateInterval;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionsConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl DirectionsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub close_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            close_zoom: CLOSE_ZOOM_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub directions: DirectionsConfig,
    pub location: UpdateInterval,
    pub map: MapConfig,
    pub home_store_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies the API key from the environment when one is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
            if !key.trim().is_empty() {
                self.directions.api_key = key;
            }
        }
        if self.directions.api_key.is_empty() {
            warn!("No directions API key configured; route requests will be rejected by the provider");
        }
        self
    }

    pub fn home_store_path(&self) -> PathBuf {
        self.home_store_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME_STORE_PATH))
    }
}
