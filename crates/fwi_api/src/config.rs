//! Service configuration
//!
//! Layering: defaults, then an optional TOML file, then `FWI_*` environment
//! variables. Command-line flags are applied last by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

/// Settings for the prediction API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Prediction artifact written by the trainer
    pub artifact_path: PathBuf,
    /// Refuse to start without a digest sidecar next to the artifact
    pub require_hash: bool,
    /// Largest accepted request body
    pub body_limit_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            artifact_path: PathBuf::from("models/fwi/active.json"),
            require_hash: false,
            body_limit_bytes: 64 * 1024,
        }
    }
}

impl ApiConfig {
    /// Load configuration from a TOML file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `FWI_*` overrides using the given variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FWI_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("FWI_PORT") {
            self.port = parse_env("FWI_PORT", &port)?;
        }
        if let Some(path) = lookup("FWI_ARTIFACT_PATH") {
            self.artifact_path = PathBuf::from(path);
        }
        if let Some(flag) = lookup("FWI_REQUIRE_HASH") {
            self.require_hash = parse_env("FWI_REQUIRE_HASH", &flag)?;
        }
        if let Some(limit) = lookup("FWI_BODY_LIMIT_BYTES") {
            self.body_limit_bytes = parse_env("FWI_BODY_LIMIT_BYTES", &limit)?;
        }
        Ok(())
    }

    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}
