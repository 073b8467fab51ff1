//! Device-local key-value store used for backups and pending appends.
//!
//! Values are opaque strings (JSON text written by the client). Keys come
//! from [`SliceKey::storage_key`](studysync_types::SliceKey::storage_key).
//!
//! Two implementations are provided:
//! - [`MemoryLocalStore`]: process memory, for tests and ephemeral sessions
//! - [`FileLocalStore`]: one file per key under a root directory

mod file;
mod memory;

pub use file::FileLocalStore;
pub use memory::MemoryLocalStore;

use async_trait::async_trait;
use thiserror::Error;

/// Local store errors.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// Filesystem failure.
    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("local store error: {0}")]
    Backend(String),
}

/// Device-local key-value store.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read a value. `Ok(None)` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    /// Remove a value. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}
