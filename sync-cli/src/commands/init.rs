//! Write the CLI configuration.

use anyhow::{Context, Result};
use std::path::Path;
use studysync_client::HttpRemoteStore;
use studysync_types::UserId;

use crate::config::CliConfig;

/// Run the init command.
pub async fn run(data_dir: &Path, endpoint: &str, user: &str, force: bool) -> Result<()> {
    if CliConfig::exists(data_dir) && !force {
        anyhow::bail!(
            "Already configured. Use --force or delete {} to reinitialize.",
            CliConfig::path(data_dir).display()
        );
    }

    // Validate before writing anything
    HttpRemoteStore::new(endpoint).with_context(|| format!("Invalid endpoint {endpoint}"))?;
    UserId::new(user).context("Invalid user id")?;

    let config = CliConfig::new(endpoint, user);
    config.save(data_dir).await?;

    println!("Configuration written!");
    println!();
    println!("  Endpoint: {}", config.endpoint);
    println!("  User:     {}", config.user);
    println!("  Data dir: {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Check connectivity: studysync status");
    println!("  2. List quizzes:       studysync list");

    Ok(())
}
