//! Remote data service abstraction for studysync.
//!
//! This module provides a pluggable remote layer that abstracts the service
//! holding one structured record per (user, data type).
//!
//! # Design
//!
//! The store trait is async and record-oriented:
//! - `fetch_slice()` reads the record, `None` when absent
//! - `upsert_slice()` writes the whole record through one of two write paths
//! - `delete_slice()` removes the record; deleting an absent record succeeds
//!
//! "Not found" is never an error on reads or deletes.
//!
//! # Example
//!
//! ```ignore
//! let store = MockRemoteStore::new();
//! store.upsert_slice(&key, &json!([]), WriteMode::Merge).await?;
//! let value = store.fetch_slice(&key).await?;
//! ```

mod http;
mod mock;

pub use http::HttpRemoteStore;
pub use mock::{MockRemoteStore, RecordedWrite};

use async_trait::async_trait;
use serde_json::Value;
use studysync_types::SliceKey;
use thiserror::Error;

/// Remote store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The service (or this write path) is unreachable or overloaded.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The write path has no record to update.
    #[error("record not found for write")]
    NotFound,

    /// The service answered but refused the request.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// Status code reported by the service.
        status: u16,
        /// Message reported by the service.
        message: String,
    },

    /// The service did not answer in time.
    #[error("remote timeout")]
    Timeout,

    /// The record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether the secondary write path should be tried after this error
    /// on the primary path.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::NotFound)
    }
}

/// Which write path to use for an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Primary path: merge into the existing record.
    Merge,
    /// Secondary path: replace the record wholesale.
    Replace,
}

/// Remote data service addressed by (user, data type).
///
/// Implementations handle the underlying service (HTTP, mock, etc).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the record for `key`. `Ok(None)` when it does not exist.
    async fn fetch_slice(&self, key: &SliceKey) -> Result<Option<Value>, StoreError>;

    /// Write the whole record for `key` through the given path.
    async fn upsert_slice(
        &self,
        key: &SliceKey,
        value: &Value,
        mode: WriteMode,
    ) -> Result<(), StoreError>;

    /// Delete the record for `key`. Succeeds when it does not exist.
    async fn delete_slice(&self, key: &SliceKey) -> Result<(), StoreError>;
}
