//! Node configuration.
//!
//! Sources, lowest to highest priority: built-in defaults,
//! `peruncache.toml`, `PERUNCACHE_*` environment variables. Command-line
//! flags override the result in `main`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::addr::valid_peer_addr;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse a configuration source.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// This node's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Address the node binds and advertises to peers (`host:port`).
    pub addr: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:9999".to_string(),
        }
    }
}

/// Cluster membership.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClusterConfig {
    /// Every peer address, this node's own included. Empty means a
    /// single-node cluster.
    pub peers: Vec<String>,
}

/// Cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Per-group cache bound in bytes; `0` means unbounded.
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 2 << 20,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main `PerunCache` node configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PerunConfig {
    /// Node identity.
    pub node: NodeConfig,
    /// Cluster membership.
    pub cluster: ClusterConfig,
    /// Cache sizing.
    pub cache: CacheConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl PerunConfig {
    /// Loads configuration from the default file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("peruncache.toml")
    }

    /// Loads configuration from a specific file path. A missing file is
    /// not an error; the defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PERUNCACHE_").split("_").lowercase(false))
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str))
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validates addresses and log level.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !valid_peer_addr(&self.node.addr) {
            return Err(ConfigError::InvalidValue {
                key: "node.addr".to_string(),
                message: format!("'{}' is not host:port", self.node.addr),
            });
        }

        for peer in &self.cluster.peers {
            if !valid_peer_addr(peer) {
                return Err(ConfigError::InvalidValue {
                    key: "cluster.peers".to_string(),
                    message: format!("'{peer}' is not host:port"),
                });
            }
        }

        if !["error", "warn", "info", "debug", "trace"].contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!("unknown log level '{}'", self.logging.level),
            });
        }

        Ok(())
    }
}
