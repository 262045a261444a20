//! Configuration for the sync layer.
//!
//! Configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! primary_key = ["org", "user"]   # or "id"
//! prefix = "_syncProvider_"
//! sync_settle_delay_ms = 2000
//!
//! [delivery]
//! mode = "acknowledged"           # or "best-effort"
//! max_attempts = 3
//! ```

use offsync_core::DeliveryPolicy;
use offsync_types::PrimaryKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default namespace prefix for every key the layer writes.
pub const DEFAULT_PREFIX: &str = "_syncProvider_";

/// Default wait between coming back online and reconciling.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Sync layer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Field(s) identifying a record. Required by caching reads, offline
    /// creates and reconciliation.
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,
    /// Namespace prefix for the local medium.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Delay before reconciling after an offline → online edge.
    #[serde(default = "default_settle_delay_ms")]
    pub sync_settle_delay_ms: u64,
    /// How reconciliation treats remote failures.
    #[serde(default)]
    pub delivery: DeliveryPolicy,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            primary_key: None,
            prefix: default_prefix(),
            sync_settle_delay_ms: default_settle_delay_ms(),
            delivery: DeliveryPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Default configuration with the given primary key.
    pub fn new(primary_key: PrimaryKey) -> Self {
        Self {
            primary_key: Some(primary_key),
            ..Self::default()
        }
    }

    /// Set the primary key.
    pub fn with_primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    /// Set the namespace prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Set the settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.sync_settle_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the delivery policy.
    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    /// The settle delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.sync_settle_delay_ms)
    }

    /// Check the configuration for values that can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::Invalid("prefix must not be empty".into()));
        }
        if let Some(pk) = &self.primary_key {
            pk.validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if let DeliveryPolicy::Acknowledged { max_attempts: 0 } = self.delivery {
            return Err(ConfigError::Invalid(
                "delivery.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Syntax)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to parse configuration text.
    #[error("failed to parse config: {0}")]
    Syntax(#[source] toml::de::Error),
    /// Parsed, but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}
