//! Resilience configuration for the sync client.
//!
//! Configuration can be loaded from a TOML file; every field is optional and
//! falls back to its default.
//!
//! ```toml
//! failure_threshold = 5
//! breaker_cooldown_secs = 30
//! max_retries = 3
//! save_timeout_secs = 25
//! flush_coalesced = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use studysync_core::{BackoffPolicy, CircuitBreaker, LoadThrottle};

/// Configuration for a [`SyncClient`](crate::SyncClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Consecutive failures that open the breaker (default: 5).
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// How long the breaker stays open, in seconds (default: 30).
    #[serde(default = "default_breaker_cooldown_secs")]
    pub breaker_cooldown_secs: u64,
    /// Retries after the first load attempt (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First retry delay in milliseconds, doubled per retry (default: 1000).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Upper bound on any retry delay in milliseconds (default: 5000).
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Minimum spacing between loads in milliseconds (default: 1000).
    #[serde(default = "default_load_throttle_ms")]
    pub load_throttle_ms: u64,
    /// Timeout for each load attempt in seconds (default: 25).
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
    /// Timeout for a full save in seconds (default: 25).
    #[serde(default = "default_save_timeout_secs")]
    pub save_timeout_secs: u64,
    /// Timeout for the network part of an append in seconds (default: 15).
    #[serde(default = "default_append_timeout_secs")]
    pub append_timeout_secs: u64,
    /// Largest item count a save may carry (default: 5000).
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Write the newest coalesced value after the outstanding write settles
    /// (default: true).
    #[serde(default = "default_flush_coalesced")]
    pub flush_coalesced: bool,
}

// Default value functions
fn default_failure_threshold() -> u32 {
    5
}

fn default_breaker_cooldown_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_cap_ms() -> u64 {
    5000
}

fn default_load_throttle_ms() -> u64 {
    1000
}

fn default_load_timeout_secs() -> u64 {
    25
}

fn default_save_timeout_secs() -> u64 {
    25
}

fn default_append_timeout_secs() -> u64 {
    15
}

fn default_max_items() -> usize {
    5000
}

fn default_flush_coalesced() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            breaker_cooldown_secs: default_breaker_cooldown_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            load_throttle_ms: default_load_throttle_ms(),
            load_timeout_secs: default_load_timeout_secs(),
            save_timeout_secs: default_save_timeout_secs(),
            append_timeout_secs: default_append_timeout_secs(),
            max_items: default_max_items(),
            flush_coalesced: default_flush_coalesced(),
        }
    }
}

impl SyncConfig {
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
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { source, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })
    }

    /// Set the breaker threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the breaker cooldown.
    pub fn with_breaker_cooldown(mut self, cooldown: Duration) -> Self {
        self.breaker_cooldown_secs = cooldown.as_secs();
        self
    }

    /// Set the retry count for loads.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the save timeout.
    pub fn with_save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the size ceiling.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Enable or disable the trailing coalesced write.
    pub fn with_flush_coalesced(mut self, flush: bool) -> Self {
        self.flush_coalesced = flush;
        self
    }

    /// Breaker cooldown.
    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }

    /// Minimum spacing between loads.
    pub fn load_throttle(&self) -> Duration {
        Duration::from_millis(self.load_throttle_ms)
    }

    /// Per-attempt load timeout.
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    /// Save timeout.
    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.save_timeout_secs)
    }

    /// Append timeout.
    pub fn append_timeout(&self) -> Duration {
        Duration::from_secs(self.append_timeout_secs)
    }

    /// Backoff policy for load retries.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_cap_ms),
            self.max_retries,
        )
    }

    /// Fresh breaker built from this configuration.
    pub fn circuit_breaker(&self) -> CircuitBreaker {
        CircuitBreaker::new(self.failure_threshold, self.breaker_cooldown())
    }

    /// Fresh load throttle built from this configuration.
    pub fn throttle(&self) -> LoadThrottle {
        LoadThrottle::new(self.load_throttle())
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = SyncConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.breaker_cooldown(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.save_timeout(), Duration::from_secs(25));
        assert_eq!(config.append_timeout(), Duration::from_secs(15));
        assert_eq!(config.max_items, 5000);
        assert!(config.flush_coalesced);
    }

    #[test]
    fn backoff_policy_from_config() {
        let policy = SyncConfig::default().backoff_policy();
        assert_eq!(policy.delay(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay(4), None);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let config = SyncConfig::from_toml_str("max_items = 10\n").unwrap();
        assert_eq!(config.max_items, 10);
        assert_eq!(config.failure_threshold, 5);

        let empty = SyncConfig::from_toml_str("").unwrap();
        assert_eq!(empty, SyncConfig::default());
    }

    #[test]
    fn builders_override_fields() {
        let config = SyncConfig::default()
            .with_failure_threshold(2)
            .with_breaker_cooldown(Duration::from_secs(5))
            .with_flush_coalesced(false);
        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.breaker_cooldown_secs, 5);
        assert!(!config.flush_coalesced);
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, "failure_threshold = \"five\"").unwrap();

        let err = SyncConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("sync.toml"));

        let missing = SyncConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::ReadError { .. }));
    }
}
