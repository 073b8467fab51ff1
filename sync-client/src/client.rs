//! SyncClient - the per-slice interface for studysync.
//!
//! This module provides [`SyncClient`], which keeps one user's data for one
//! data type consistent between the in-memory value, the device-local store
//! and the remote data service.
//!
//! # Architecture
//!
//! SyncClient consults the pure state machines from sync-core (breaker,
//! backoff, throttle, coalescer) around every remote call and performs the
//! actual I/O through the [`RemoteStore`] and [`LocalStore`] traits.
//!
//! ```text
//! Application → SyncClient → SliceAdapter → RemoteStore → Network
//!                   ↓              ↘
//!              sync-core            LocalStore (backup, pending append)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use studysync_client::{SyncClient, SyncConfig, MockRemoteStore, MemoryLocalStore};
//!
//! let client: SyncClient<Vec<Question>, _, _> = SyncClient::new(
//!     DataType::QuestionBank,
//!     MockRemoteStore::new(),
//!     MemoryLocalStore::new(),
//!     SyncConfig::default(),
//! );
//! client.sign_in(UserId::new("user-1")?);
//!
//! let bank = client.load().await;
//! client.append_incremental(vec![question]).await?;
//! ```

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use studysync_core::{
    Admission, BreakerState, CircuitBreaker, FailureOutcome, LoadThrottle, WriteCoalescer,
};
use studysync_types::{DataType, Keyed, SliceData, SliceKey, SliceState, UserId};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::adapter::SliceAdapter;
use crate::config::SyncConfig;
use crate::local::{LocalStore, LocalStoreError};
use crate::remote::{RemoteStore, StoreError};

/// Local key suffix holding the last value that failed to reach the remote.
pub const BACKUP_SUFFIX: &str = "backup";

/// Local key suffix holding appended items not yet confirmed remotely.
pub const PENDING_APPEND_SUFFIX: &str = "pending-append";

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No user is signed in.
    #[error("not signed in")]
    NotSignedIn,

    /// The value exceeds the item ceiling.
    #[error("payload too large: {count} items (limit {limit})")]
    PayloadTooLarge {
        /// Items in the rejected value.
        count: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// The circuit breaker is open.
    #[error("circuit breaker open")]
    CircuitOpen,

    /// Append is only available for the bulk-growth slice.
    #[error("append not supported for {0}")]
    AppendUnsupported(DataType),

    /// Another load is already running for this slice.
    #[error("load already in flight")]
    LoadInFlight,

    /// Loads are being throttled.
    #[error("load throttled")]
    Throttled,

    /// The signed-in user changed while the call was running.
    #[error("superseded by a user change")]
    Superseded,

    /// Remote store error.
    #[error("remote error: {0}")]
    Store(#[from] StoreError),

    /// Local store error.
    #[error("local store error: {0}")]
    LocalStore(#[from] LocalStoreError),

    /// The call did not finish in time.
    #[error("timed out")]
    Timeout,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// How a save was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The value reached the remote.
    Written,
    /// Another write was outstanding; this call did not write.
    Coalesced,
    /// The breaker is open; the value was kept locally.
    ShortCircuited,
    /// The remote write failed but the value is held in the local store.
    BackedUp,
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Clears the in-flight load flag when a load ends, cancelled or not.
struct LoadGuard<'a, T> {
    flag: &'a AtomicBool,
    state: &'a RwLock<SliceState<T>>,
}

impl<'a, T> LoadGuard<'a, T> {
    fn acquire(flag: &'a AtomicBool, state: &'a RwLock<SliceState<T>>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        state.write().loading = true;
        Some(Self { flag, state })
    }
}

impl<T> Drop for LoadGuard<'_, T> {
    fn drop(&mut self) {
        self.state.write().loading = false;
        self.flag.store(false, Ordering::Release);
    }
}

/// Releases the write slot if a persist is dropped mid-write.
struct WriteSlot<'a, T> {
    coalescer: &'a Mutex<WriteCoalescer<T>>,
    armed: bool,
}

impl<T> WriteSlot<'_, T> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T> Drop for WriteSlot<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.coalescer.lock().abandon();
        }
    }
}

/// Resilient client for one slice (one user, one data type).
///
/// All methods take `&self`; share the client with `Arc`.
pub struct SyncClient<T, R, L> {
    data_type: DataType,
    config: SyncConfig,
    adapter: SliceAdapter<R>,
    local: L,
    user: RwLock<Option<UserId>>,
    state: RwLock<SliceState<T>>,
    breaker: Mutex<CircuitBreaker>,
    throttle: Mutex<LoadThrottle>,
    coalescer: Mutex<WriteCoalescer<T>>,
    loading: AtomicBool,
    generation: AtomicU64,
}

impl<T, R, L> SyncClient<T, R, L>
where
    T: SliceData,
    R: RemoteStore,
    L: LocalStore,
{
    /// Create a signed-out client for `data_type`.
    pub fn new(data_type: DataType, remote: R, local: L, config: SyncConfig) -> Self {
        Self {
            data_type,
            adapter: SliceAdapter::new(remote),
            local,
            user: RwLock::new(None),
            state: RwLock::new(SliceState::default()),
            breaker: Mutex::new(config.circuit_breaker()),
            throttle: Mutex::new(config.throttle()),
            coalescer: Mutex::new(WriteCoalescer::new(config.flush_coalesced)),
            loading: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            config,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Attach a user. Switching users resets the slice to its default.
    pub fn sign_in(&self, user: UserId) {
        {
            let mut current = self.user.write();
            if current.as_ref() == Some(&user) {
                return;
            }
            info!(data_type = %self.data_type, user = %user, "signed in");
            *current = Some(user);
        }
        self.reset_session();
    }

    /// Detach the user. The slice resets and loads stop.
    pub fn sign_out(&self) {
        let previous = self.user.write().take();
        if previous.is_some() {
            info!(data_type = %self.data_type, "signed out");
            self.reset_session();
        }
    }

    fn reset_session(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let loading = self.loading.load(Ordering::Acquire);
        *self.state.write() = SliceState {
            loading,
            ..SliceState::default()
        };
        self.throttle.lock().reset();
    }

    fn current_key(&self) -> Option<SliceKey> {
        self.user
            .read()
            .as_ref()
            .map(|user| SliceKey::new(user.clone(), self.data_type))
    }

    fn require_key(&self) -> Result<SliceKey, ClientError> {
        self.current_key().ok_or(ClientError::NotSignedIn)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Data type this client serves.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Signed-in user.
    pub fn user(&self) -> Option<UserId> {
        self.user.read().clone()
    }

    /// Resilience configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Underlying remote store.
    pub fn remote(&self) -> &R {
        self.adapter.remote()
    }

    /// Underlying local store.
    pub fn local(&self) -> &L {
        &self.local
    }

    /// Current in-memory value.
    pub fn value(&self) -> T {
        self.state.read().value.clone()
    }

    /// Whether a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Last surfaced error.
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Value, loading flag and error together.
    pub fn snapshot(&self) -> SliceState<T> {
        self.state.read().clone()
    }

    /// Breaker counters.
    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.lock().state()
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Load the slice from the remote.
    ///
    /// Never fails: skipped loads (signed out, breaker open, throttled,
    /// already loading) and exhausted retries all return the in-memory value.
    pub async fn load(&self) -> T {
        match self.run_load(false).await {
            Ok(value) => value,
            Err(e) => {
                debug!(data_type = %self.data_type, error = %e, "load returned cached value");
                self.value()
            }
        }
    }

    /// Load bypassing the throttle, reporting whether fresh data arrived.
    pub async fn refresh(&self) -> Result<T, ClientError> {
        self.run_load(true).await
    }

    async fn run_load(&self, force: bool) -> Result<T, ClientError> {
        let Some(key) = self.current_key() else {
            *self.state.write() = SliceState::default();
            return Err(ClientError::NotSignedIn);
        };

        let remaining = self.breaker.lock().remaining_cooldown(now());
        if let Some(remaining) = remaining {
            debug!(slice = %key, ?remaining, "breaker open, skipping load");
            return Err(ClientError::CircuitOpen);
        }

        let Some(_guard) = LoadGuard::acquire(&self.loading, &self.state) else {
            debug!(slice = %key, "load already in flight");
            return Err(ClientError::LoadInFlight);
        };

        let admitted = {
            let mut throttle = self.throttle.lock();
            if force {
                throttle.mark(now());
                true
            } else {
                throttle.try_acquire(now())
            }
        };
        if !admitted {
            debug!(slice = %key, "load throttled");
            return Err(ClientError::Throttled);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        self.fetch_with_retry(&key, generation).await
    }

    async fn fetch_with_retry(&self, key: &SliceKey, generation: u64) -> Result<T, ClientError> {
        let policy = self.config.backoff_policy();
        let mut retry = 0;

        loop {
            let attempt = tokio::time::timeout(
                self.config.load_timeout(),
                self.adapter.fetch_or_default::<T>(key),
            )
            .await
            .unwrap_or(Err(StoreError::Timeout));

            if self.is_stale(generation) {
                return Err(ClientError::Superseded);
            }

            let err = match attempt {
                Ok(remote) => {
                    self.breaker.lock().record_success();
                    let merged = self.merge_local(key, remote).await;
                    if self.is_stale(generation) {
                        return Err(ClientError::Superseded);
                    }
                    let mut state = self.state.write();
                    state.value = merged.clone();
                    state.last_error = None;
                    debug!(slice = %key, items = merged.item_count(), "slice loaded");
                    return Ok(merged);
                }
                Err(err) => err,
            };

            if let FailureOutcome::Tripped { .. } = self.record_failure(key, &err) {
                self.fall_back(key, &err, generation).await;
                return Err(ClientError::CircuitOpen);
            }

            retry += 1;
            match policy.delay(retry) {
                Some(delay) => {
                    warn!(slice = %key, retry, ?delay, error = %err, "load failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(slice = %key, error = %err, "load retries exhausted");
                    self.fall_back(key, &err, generation).await;
                    return Err(err.into());
                }
            }
        }
    }

    /// Revert to the default value plus any local backup entries.
    async fn fall_back(&self, key: &SliceKey, err: &StoreError, generation: u64) {
        let value = self.merge_local(key, T::default()).await;
        if self.is_stale(generation) {
            return;
        }
        let mut state = self.state.write();
        state.value = value;
        state.last_error = Some(err.to_string());
    }

    fn record_failure(&self, key: &SliceKey, err: &StoreError) -> FailureOutcome {
        let outcome = self.breaker.lock().record_failure(now());
        match outcome {
            FailureOutcome::Tripped { .. } => {
                error!(
                    slice = %key,
                    error = %err,
                    cooldown = ?self.config.breaker_cooldown(),
                    "circuit breaker opened"
                );
            }
            FailureOutcome::Counted {
                consecutive_failures,
            } => {
                debug!(slice = %key, consecutive_failures, "remote failure counted");
            }
        }
        outcome
    }

    // =========================================================================
    // Local backup
    // =========================================================================

    /// Merge backup and pending-append entries absent from `value`.
    async fn merge_local(&self, key: &SliceKey, mut value: T) -> T {
        if !self.data_type.supports_local_backup() {
            return value;
        }
        for suffix in [BACKUP_SUFFIX, PENDING_APPEND_SUFFIX] {
            match self.read_local::<T>(&key.storage_key(suffix)).await {
                Ok(Some(local)) => {
                    let added = value.merge_missing(local);
                    if added > 0 {
                        info!(slice = %key, added, source = suffix, "merged local entries");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(slice = %key, error = %e, "ignoring unreadable local entry"),
            }
        }
        value
    }

    async fn read_local<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, ClientError> {
        let Some(raw) = self.local.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }

    async fn write_local<V: Serialize>(&self, key: &str, value: &V) -> Result<(), ClientError> {
        let raw =
            serde_json::to_string(value).map_err(|e| ClientError::Serialization(e.to_string()))?;
        self.local.set(key, &raw).await?;
        Ok(())
    }

    async fn mirror_to_backup(&self, key: &SliceKey, value: &T) {
        if !self.data_type.supports_local_backup() {
            return;
        }
        match self.write_local(&key.storage_key(BACKUP_SUFFIX), value).await {
            Ok(()) => debug!(slice = %key, "value mirrored to local backup"),
            Err(e) => warn!(slice = %key, error = %e, "local backup failed"),
        }
    }

    /// Drop local state a confirmed write of `written` has made redundant.
    ///
    /// The backup is a whole value and is superseded outright. The pending
    /// append is a delta, so only its entries present in `written` go.
    async fn release_local(&self, key: &SliceKey, written: &T) {
        if !self.data_type.supports_local_backup() {
            return;
        }
        if let Err(e) = self.local.remove(&key.storage_key(BACKUP_SUFFIX)).await {
            warn!(slice = %key, error = %e, "failed to clear local backup");
        }

        let pending_key = key.storage_key(PENDING_APPEND_SUFFIX);
        let remaining = match self.read_local::<T>(&pending_key).await {
            Ok(None) => return,
            Ok(Some(mut pending)) => {
                let remaining = pending.retain_uncovered(written);
                if remaining > 0 {
                    debug!(slice = %key, remaining, "pending append not yet written");
                    if let Err(e) = self.write_local(&pending_key, &pending).await {
                        warn!(slice = %key, error = %e, "failed to restage pending append");
                    }
                }
                remaining
            }
            Err(e) => {
                warn!(slice = %key, error = %e, "discarding unreadable pending append");
                0
            }
        };
        if remaining == 0 {
            if let Err(e) = self.local.remove(&pending_key).await {
                warn!(slice = %key, error = %e, "failed to clear pending append");
            }
        }
    }

    async fn clear_local(&self, key: &SliceKey) {
        if !self.data_type.supports_local_backup() {
            return;
        }
        for suffix in [BACKUP_SUFFIX, PENDING_APPEND_SUFFIX] {
            if let Err(e) = self.local.remove(&key.storage_key(suffix)).await {
                warn!(slice = %key, error = %e, "failed to clear local entry");
            }
        }
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Save the whole slice.
    ///
    /// The in-memory value is updated before any network attempt.
    pub async fn save(&self, value: T) -> Result<SaveOutcome, ClientError> {
        let key = self.require_key()?;
        self.check_size(value.item_count())?;

        self.state.write().value = value.clone();
        self.persist(&key, value, self.config.save_timeout()).await
    }

    fn check_size(&self, count: usize) -> Result<(), ClientError> {
        if count > self.config.max_items {
            warn!(data_type = %self.data_type, count, limit = self.config.max_items, "payload too large");
            return Err(ClientError::PayloadTooLarge {
                count,
                limit: self.config.max_items,
            });
        }
        Ok(())
    }

    async fn persist(
        &self,
        key: &SliceKey,
        value: T,
        limit: Duration,
    ) -> Result<SaveOutcome, ClientError> {
        let open = self.breaker.lock().is_open(now());
        if open {
            debug!(slice = %key, "breaker open, keeping save local");
            self.mirror_to_backup(key, &value).await;
            return Ok(SaveOutcome::ShortCircuited);
        }

        let admission = self.coalescer.lock().admit(value);
        let mut next = match admission {
            Admission::Write(value) => value,
            Admission::Coalesced => {
                debug!(slice = %key, "write outstanding, save coalesced");
                return Ok(SaveOutcome::Coalesced);
            }
        };

        let mut slot = WriteSlot {
            coalescer: &self.coalescer,
            armed: true,
        };
        let generation = self.generation.load(Ordering::SeqCst);
        let mut wrote = false;

        loop {
            let result = match tokio::time::timeout(
                limit,
                self.adapter.upsert_with_fallback(key, &next),
            )
            .await
            {
                Ok(result) => result.map_err(ClientError::from),
                Err(_) => Err(ClientError::Timeout),
            };

            match result {
                Ok(mode) => {
                    debug!(slice = %key, ?mode, "slice written");
                    self.breaker.lock().record_success();
                    self.release_local(key, &next).await;
                    wrote = true;

                    let trailing = self.coalescer.lock().settle();
                    match trailing {
                        Some(value) => {
                            debug!(slice = %key, "writing coalesced value");
                            next = value;
                        }
                        None => {
                            slot.disarm();
                            return Ok(SaveOutcome::Written);
                        }
                    }
                }
                Err(err) => {
                    let store_err = match &err {
                        ClientError::Store(e) => e.clone(),
                        _ => StoreError::Timeout,
                    };
                    self.record_failure(key, &store_err);

                    let trailing = self.coalescer.lock().abandon();
                    slot.disarm();
                    let latest = trailing.unwrap_or(next);
                    self.mirror_to_backup(key, &latest).await;
                    if !self.is_stale(generation) {
                        self.state.write().last_error = Some(err.to_string());
                    }
                    warn!(slice = %key, error = %err, "save failed");

                    if wrote {
                        return Ok(SaveOutcome::Written);
                    }
                    return Err(err);
                }
            }
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete the remote record and reset the slice to its default.
    pub async fn delete(&self) -> Result<(), ClientError> {
        let key = self.require_key()?;
        let open = self.breaker.lock().is_open(now());
        if open {
            return Err(ClientError::CircuitOpen);
        }

        {
            let mut state = self.state.write();
            state.value = T::default();
            state.last_error = None;
        }
        self.clear_local(&key).await;

        let result = tokio::time::timeout(self.config.save_timeout(), self.adapter.delete(&key))
            .await
            .unwrap_or(Err(StoreError::Timeout));
        match result {
            Ok(()) => {
                self.breaker.lock().record_success();
                info!(slice = %key, "slice deleted");
                Ok(())
            }
            Err(err) => {
                self.record_failure(&key, &err);
                self.state.write().last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    // =========================================================================
    // Contract surface
    // =========================================================================

    /// Save, reporting whether the value was accepted for remote persistence.
    pub async fn upsert_data(&self, value: T) -> bool {
        match self.save(value).await {
            Ok(SaveOutcome::ShortCircuited) => false,
            Ok(_) => true,
            Err(e) => {
                debug!(data_type = %self.data_type, error = %e, "upsert failed");
                false
            }
        }
    }

    /// Delete, reporting success.
    pub async fn delete_data(&self) -> bool {
        self.delete().await.is_ok()
    }

    /// Force a fresh load and return the resulting value.
    pub async fn refresh_data(&self) -> T {
        match self.refresh().await {
            Ok(value) => value,
            Err(_) => self.value(),
        }
    }
}

impl<V, R, L> SyncClient<Vec<V>, R, L>
where
    V: Keyed + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    R: RemoteStore,
    L: LocalStore,
{
    /// Append items to a bulk-growth slice.
    ///
    /// The items are applied in memory and recorded under the pending-append
    /// key before the network write; a failed write still reports success.
    pub async fn append_incremental(&self, items: Vec<V>) -> Result<SaveOutcome, ClientError> {
        let key = self.require_key()?;
        if !self.data_type.supports_append() {
            return Err(ClientError::AppendUnsupported(self.data_type));
        }

        let updated = {
            let mut state = self.state.write();
            let count = state.value.len() + items.len();
            self.check_size(count)?;
            state.value.extend(items.iter().cloned());
            state.value.clone()
        };

        self.stage_pending(&key, items).await;

        match self
            .persist(&key, updated, self.config.append_timeout())
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                info!(slice = %key, error = %e, "append kept locally");
                Ok(SaveOutcome::BackedUp)
            }
        }
    }

    /// Add `items` to the unconfirmed delta in the local store.
    async fn stage_pending(&self, key: &SliceKey, items: Vec<V>) {
        let pending_key = key.storage_key(PENDING_APPEND_SUFFIX);
        let mut pending: Vec<V> = match self.read_local(&pending_key).await {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => {
                warn!(slice = %key, error = %e, "discarding unreadable pending append");
                Vec::new()
            }
        };
        pending.merge_missing(items);
        if let Err(e) = self.write_local(&pending_key, &pending).await {
            warn!(slice = %key, error = %e, "failed to stage pending append");
        }
    }

    /// Append, reporting success (always true once signed in on the
    /// bulk-growth slice).
    pub async fn append_questions(&self, items: Vec<V>) -> bool {
        self.append_incremental(items).await.is_ok()
    }
}
