//! CLI command implementations.

pub mod dedupe;
pub mod delete;
pub mod init;
pub mod list;
pub mod status;

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use studysync_client::{FileLocalStore, HttpRemoteStore, LocalStore, RemoteStore, SyncClient};
use studysync_quiz::QuizManager;
use studysync_types::{DataType, Quiz, UserId};
use tracing::debug;

use crate::config::CliConfig;

/// Manager over the HTTP remote and the file-backed local store.
pub type CliManager = QuizManager<HttpRemoteStore, FileLocalStore>;

/// Build a signed-in manager from the data directory and load its snapshot.
///
/// Fails when the load fails, so no command acts on an empty snapshot that
/// only stands in for unreachable data.
pub async fn open(data_dir: &Path) -> Result<(CliConfig, CliManager)> {
    let (config, manager) = connect(data_dir).await?;
    load_checked(&manager).await?;
    Ok((config, manager))
}

/// Build a signed-in manager without loading it.
pub async fn connect(data_dir: &Path) -> Result<(CliConfig, CliManager)> {
    let config = CliConfig::load(data_dir).await?;
    let remote = HttpRemoteStore::with_timeout(&config.endpoint, config.sync.save_timeout())
        .with_context(|| format!("Invalid endpoint {}", config.endpoint))?;
    let local = FileLocalStore::new(CliConfig::local_dir(data_dir));
    let user = UserId::new(config.user.as_str()).context("Invalid user id in configuration")?;

    debug!(endpoint = %config.endpoint, user = %config.user, "connecting");
    let client = SyncClient::new(DataType::Quizzes, remote, local, config.sync.clone());
    client.sign_in(user);
    Ok((config, QuizManager::new(Arc::new(client))))
}

/// Load the snapshot, failing if the client recorded an error.
pub async fn load_checked<R, L>(manager: &QuizManager<R, L>) -> Result<()>
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    manager.load().await;
    if let Some(error) = manager.client().last_error() {
        bail!("Could not load quizzes: {error}");
    }
    Ok(())
}

/// Resolve a quiz by id, falling back to its display number.
pub fn resolve<R, L>(manager: &QuizManager<R, L>, key: &str) -> Result<Quiz>
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    manager
        .find_by_id(key)
        .or_else(|| {
            key.trim_start_matches('#')
                .parse::<u32>()
                .ok()
                .and_then(|n| manager.find_by_number(n))
        })
        .with_context(|| format!("No quiz matches '{key}'"))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use studysync_client::{MemoryLocalStore, MockRemoteStore, SyncConfig};
    use studysync_types::{QuizStatus, SliceKey};

    pub type TestManager = QuizManager<MockRemoteStore, MemoryLocalStore>;

    pub fn key() -> SliceKey {
        SliceKey::new(UserId::new("cli-user").unwrap(), DataType::Quizzes)
    }

    /// A loaded manager whose remote already holds `statuses.len()` quizzes.
    pub async fn manager_with(statuses: &[QuizStatus]) -> (TestManager, MockRemoteStore) {
        let (manager, remote) = unloaded(statuses, SyncConfig::default());
        load_checked(&manager).await.unwrap();
        (manager, remote)
    }

    pub fn unloaded(statuses: &[QuizStatus], config: SyncConfig) -> (TestManager, MockRemoteStore) {
        let remote = MockRemoteStore::new();
        let quizzes: Vec<Quiz> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Quiz::new(i as u32 + 1, *status))
            .collect();
        remote.set_record(&key(), serde_json::to_value(&quizzes).unwrap());

        let client = SyncClient::new(
            DataType::Quizzes,
            remote.clone(),
            MemoryLocalStore::new(),
            config,
        );
        client.sign_in(UserId::new("cli-user").unwrap());
        (QuizManager::new(Arc::new(client)), remote)
    }

    pub fn remote_quizzes(remote: &MockRemoteStore) -> Vec<Quiz> {
        remote
            .record(&key())
            .map(|v| serde_json::from_value(v).unwrap())
            .unwrap_or_default()
    }
}
