//! Typed adapter over a [`RemoteStore`].
//!
//! Converts between slice values and JSON, treats absent records as the
//! slice default, and falls back from the merge write path to the replace
//! path when the primary path is unavailable.

use crate::remote::{RemoteStore, StoreError, WriteMode};
use studysync_types::{SliceData, SliceKey};
use tracing::{debug, warn};

/// Typed access to slice records.
#[derive(Debug)]
pub struct SliceAdapter<R> {
    remote: R,
}

impl<R: RemoteStore> SliceAdapter<R> {
    /// Wrap a remote store.
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    /// Underlying remote store.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Fetch a slice, returning the default value when the record is absent
    /// or explicitly null.
    pub async fn fetch_or_default<T: SliceData>(&self, key: &SliceKey) -> Result<T, StoreError> {
        match self.remote.fetch_slice(key).await? {
            None | Some(serde_json::Value::Null) => {
                debug!(slice = %key, "no remote record, using default");
                Ok(T::default())
            }
            Some(value) => {
                serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
            }
        }
    }

    /// Write the whole slice. Tries the merge path first and falls back to
    /// the replace path once when the error allows it.
    ///
    /// Returns the path that succeeded.
    pub async fn upsert_with_fallback<T: SliceData>(
        &self,
        key: &SliceKey,
        value: &T,
    ) -> Result<WriteMode, StoreError> {
        let json =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;

        match self.remote.upsert_slice(key, &json, WriteMode::Merge).await {
            Ok(()) => Ok(WriteMode::Merge),
            Err(e) if e.allows_fallback() => {
                warn!(slice = %key, error = %e, "primary write path failed, using replace");
                self.remote
                    .upsert_slice(key, &json, WriteMode::Replace)
                    .await?;
                Ok(WriteMode::Replace)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the slice record.
    pub async fn delete(&self, key: &SliceKey) -> Result<(), StoreError> {
        self.remote.delete_slice(key).await
    }
}
