//! Configuration loaders for `RpcCommunicatorConfig`.
//!
//! Values absent from the source keep their defaults. Every loader validates
//! the result before returning it.

use crate::domain::RpcCommunicatorConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read config file {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// TOML parsing error.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A value was present but unusable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    rpc: RpcConfigFile,
}

#[derive(Debug, Deserialize, Default)]
struct RpcConfigFile {
    rpc_request_timeout_ms: Option<u64>,
    fallback_timeout_ms: Option<u64>,
    method_timeout_ms: Option<u64>,
    event_capacity: Option<usize>,
}

impl RpcConfigFile {
    fn apply(self, mut config: RpcCommunicatorConfig) -> RpcCommunicatorConfig {
        if let Some(ms) = self.rpc_request_timeout_ms {
            config.rpc_request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.fallback_timeout_ms {
            config.fallback_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.method_timeout_ms {
            config.method_timeout = Duration::from_millis(ms);
        }
        if let Some(capacity) = self.event_capacity {
            config.event_capacity = capacity;
        }
        config
    }
}

impl RpcCommunicatorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Config File Format
    ///
    /// ```toml
    /// [rpc]
    /// rpc_request_timeout_ms = 5000
    /// fallback_timeout_ms = 1000
    /// method_timeout_ms = 1000
    /// event_capacity = 1000
    /// ```
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let config = file.rpc.apply(Self::default());
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load configuration from `PROTO_RPC_*` environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `PROTO_RPC_REQUEST_TIMEOUT_MS` | `rpc_request_timeout` |
    /// | `PROTO_RPC_FALLBACK_TIMEOUT_MS` | `fallback_timeout` |
    /// | `PROTO_RPC_METHOD_TIMEOUT_MS` | `method_timeout` |
    /// | `PROTO_RPC_EVENT_CAPACITY` | `event_capacity` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> Result<Option<u64>, ConfigError> {
            match lookup(key) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|e| ConfigError::Invalid(format!("{}={:?}: {}", key, raw, e))),
            }
        };

        let file = RpcConfigFile {
            rpc_request_timeout_ms: number("PROTO_RPC_REQUEST_TIMEOUT_MS")?,
            fallback_timeout_ms: number("PROTO_RPC_FALLBACK_TIMEOUT_MS")?,
            method_timeout_ms: number("PROTO_RPC_METHOD_TIMEOUT_MS")?,
            event_capacity: number("PROTO_RPC_EVENT_CAPACITY")?
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
        };

        let config = file.apply(Self::default());
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}
