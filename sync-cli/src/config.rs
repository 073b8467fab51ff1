//! Configuration management for the studysync CLI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use studysync_client::SyncConfig;

const CONFIG_FILE: &str = "config.toml";

/// CLI configuration stored in the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the remote data service.
    pub endpoint: String,
    /// User whose quizzes the CLI operates on.
    pub user: String,
    /// Resilience settings for the sync client.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl CliConfig {
    /// Create a configuration with default resilience settings.
    pub fn new(endpoint: &str, user: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            user: user.to_string(),
            sync: SyncConfig::default(),
        }
    }

    /// Path of the config file inside a data directory.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Load configuration from a data directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Not configured. Run 'studysync init' first.")?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Save configuration to a data directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = Self::path(data_dir);
        let contents = toml::to_string_pretty(self).context("Failed to encode configuration")?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save configuration")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Check if a configuration exists.
    pub fn exists(data_dir: &Path) -> bool {
        Self::path(data_dir).exists()
    }

    /// Directory for the device-local backup store.
    pub fn local_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("local")
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
