//! Application configuration.
//!
//! Layers, lowest to highest: built-in defaults, JSON file
//! (~/.masjid/config.json or --config), environment, CLI flags (applied by
//! the binary). The backend is only configured when both its URL and key
//! are known.

use crate::geo::{Coordinate, CoordinateError};
use crate::location::DEFAULT_COORDINATE;
use crate::places::{EmptyRemotePolicy, RemoteConfig};
use crate::prayer::{AsrJuristic, CalculationMethod};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const ENV_BACKEND_URL: &str = "MASJID_BACKEND_URL";
pub const ENV_BACKEND_KEY: &str = "MASJID_BACKEND_KEY";
pub const ENV_BACKEND_TIMEOUT: &str = "MASJID_BACKEND_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("cannot parse config {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("invalid default location: {0}")]
    Location(#[from] CoordinateError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: Option<RemoteConfig>,
    /// Used when the location provider denies or fails.
    pub default_location: Coordinate,
    pub empty_remote_policy: EmptyRemotePolicy,
    pub method: CalculationMethod,
    pub asr: AsrJuristic,
    /// IANA zone for displayed times. UTC when unset.
    pub timezone: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: None,
            default_location: DEFAULT_COORDINATE,
            empty_remote_policy: EmptyRemotePolicy::default(),
            method: CalculationMethod::default(),
            asr: AsrJuristic::default(),
            timezone: None,
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".masjid")
            .join("config.json")
    }

    /// Load file + process environment. An explicit path must exist; the
    /// default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::read_file(p)?,
            None => {
                let p = Self::default_path();
                if p.exists() {
                    Self::read_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "loaded config file");
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay backend settings from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        match (non_empty(ENV_BACKEND_URL), non_empty(ENV_BACKEND_KEY)) {
            (Some(url), Some(key)) => {
                let timeout_secs = self.remote.as_ref().and_then(|r| r.timeout_secs);
                self.remote = Some(RemoteConfig { url, api_key: key, timeout_secs });
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!(
                    "{} and {} must both be set; ignoring partial backend settings",
                    ENV_BACKEND_URL, ENV_BACKEND_KEY
                );
            }
            (None, None) => {}
        }

        if let Some(raw) = non_empty(ENV_BACKEND_TIMEOUT) {
            match (raw.parse::<u64>(), self.remote.as_mut()) {
                (Ok(secs), Some(remote)) => remote.timeout_secs = Some(secs),
                (Ok(_), None) => {}
                (Err(_), _) => warn!(
                    "ignoring {}={}: not a whole number of seconds",
                    ENV_BACKEND_TIMEOUT, raw
                ),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_location.validate()?;
        self.tz()?;
        if let Some(remote) = &self.remote {
            if remote.url.trim().is_empty() || remote.api_key.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "backend url and api_key must be non-empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Display timezone, UTC when unset.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        match &self.timezone {
            Some(name) => name
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("unknown timezone '{}'", name))),
            None => Ok(chrono_tz::UTC),
        }
    }
}
