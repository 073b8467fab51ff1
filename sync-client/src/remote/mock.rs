//! Mock remote store for testing.
//!
//! Keeps records in memory, counts calls, and allows injecting failures and
//! latency for verification of the client's resilience behaviour.

use super::{RemoteStore, StoreError, WriteMode};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use studysync_types::SliceKey;

/// A write that reached the mock store.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    /// Target record.
    pub key: SliceKey,
    /// Path used.
    pub mode: WriteMode,
    /// Value written.
    pub value: Value,
}

/// Mock remote store for testing.
///
/// Clones share state, so a test can keep a handle while the client owns
/// another.
#[derive(Debug, Default, Clone)]
pub struct MockRemoteStore {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    records: HashMap<SliceKey, Value>,
    fetch_calls: usize,
    write_calls: usize,
    delete_calls: usize,
    writes: Vec<RecordedWrite>,
    fail_next_fetch: Option<String>,
    fail_next_write: Option<String>,
    fail_all_fetches: bool,
    fail_all_writes: bool,
    fail_all_deletes: bool,
    primary_unavailable: bool,
    fetch_delay: Option<Duration>,
    write_delay: Option<Duration>,
}

impl MockRemoteStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record.
    pub fn set_record(&self, key: &SliceKey, value: Value) {
        self.inner.lock().records.insert(key.clone(), value);
    }

    /// Current record for `key`.
    pub fn record(&self, key: &SliceKey) -> Option<Value> {
        self.inner.lock().records.get(key).cloned()
    }

    /// Number of `fetch_slice` calls, failed ones included.
    pub fn fetch_calls(&self) -> usize {
        self.inner.lock().fetch_calls
    }

    /// Number of `upsert_slice` calls, failed ones included.
    pub fn write_calls(&self) -> usize {
        self.inner.lock().write_calls
    }

    /// Number of `delete_slice` calls.
    pub fn delete_calls(&self) -> usize {
        self.inner.lock().delete_calls
    }

    /// Writes that succeeded, in order.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.inner.lock().writes.clone()
    }

    /// Cause the next fetch to fail with `Unavailable`.
    pub fn fail_next_fetch(&self, error: &str) {
        self.inner.lock().fail_next_fetch = Some(error.to_string());
    }

    /// Cause the next write to fail with `Unavailable` on both paths.
    pub fn fail_next_write(&self, error: &str) {
        self.inner.lock().fail_next_write = Some(error.to_string());
    }

    /// Make every fetch fail until turned off.
    pub fn fail_all_fetches(&self, fail: bool) {
        self.inner.lock().fail_all_fetches = fail;
    }

    /// Make every write fail until turned off.
    pub fn fail_all_writes(&self, fail: bool) {
        self.inner.lock().fail_all_writes = fail;
    }

    /// Make every delete fail until turned off.
    pub fn fail_all_deletes(&self, fail: bool) {
        self.inner.lock().fail_all_deletes = fail;
    }

    /// Make the primary (merge) write path report `Unavailable`.
    pub fn set_primary_unavailable(&self, unavailable: bool) {
        self.inner.lock().primary_unavailable = unavailable;
    }

    /// Delay every fetch by `delay` before answering.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        self.inner.lock().fetch_delay = delay;
    }

    /// Delay every write by `delay` before answering.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        self.inner.lock().write_delay = delay;
    }

    /// Clear all state (records, counters, failures).
    pub fn reset(&self) {
        *self.inner.lock() = MockRemoteInner::default();
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn fetch_slice(&self, key: &SliceKey) -> Result<Option<Value>, StoreError> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.fetch_calls += 1;
            inner.fetch_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        if let Some(error) = inner.fail_next_fetch.take() {
            return Err(StoreError::Unavailable(error));
        }
        if inner.fail_all_fetches {
            return Err(StoreError::Unavailable("injected fetch failure".into()));
        }
        Ok(inner.records.get(key).cloned())
    }

    async fn upsert_slice(
        &self,
        key: &SliceKey,
        value: &Value,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.write_calls += 1;
            inner.write_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        if mode == WriteMode::Merge && inner.primary_unavailable {
            return Err(StoreError::Unavailable("primary path offline".into()));
        }
        if inner.fail_all_writes {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        if mode == WriteMode::Replace {
            // A one-shot failure covers both paths of the same upsert.
            if let Some(error) = inner.fail_next_write.take() {
                return Err(StoreError::Unavailable(error));
            }
        } else if let Some(error) = inner.fail_next_write.clone() {
            return Err(StoreError::Unavailable(error));
        }

        inner.records.insert(key.clone(), value.clone());
        inner.writes.push(RecordedWrite {
            key: key.clone(),
            mode,
            value: value.clone(),
        });
        Ok(())
    }

    async fn delete_slice(&self, key: &SliceKey) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.delete_calls += 1;
        if inner.fail_all_deletes {
            return Err(StoreError::Unavailable("injected delete failure".into()));
        }
        inner.records.remove(key);
        Ok(())
    }
}
