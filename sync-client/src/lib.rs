//! # sync-client
//!
//! Resilient per-user slice sync for studysync.
//!
//! This is the main library that applications use to keep study data in
//! sync with the remote data service.
//!
//! ## Features
//!
//! - **Circuit Breaker**: consecutive failures open the breaker and calls
//!   short-circuit to the cached value until the cooldown elapses
//! - **Retry with Backoff**: loads retry with capped exponential backoff
//! - **Optimistic Writes**: the in-memory value changes before the network
//! - **Write Coalescing**: one outstanding write per slice, newest value
//!   written next
//! - **Local Backstop**: failed writes and appends are kept in a
//!   device-local store and merged back on the next load
//! - **Pluggable Stores**: remote (HTTP, mock) and local (file, memory)
//!
//! ## Example
//!
//! ```ignore
//! use studysync_client::{HttpRemoteStore, FileLocalStore, SyncClient, SyncConfig};
//! use studysync_types::{DataType, QuizList, UserId};
//!
//! let client: SyncClient<QuizList, _, _> = SyncClient::new(
//!     DataType::Quizzes,
//!     HttpRemoteStore::new("https://data.example.com/v1")?,
//!     FileLocalStore::new("/var/lib/studysync"),
//!     SyncConfig::default(),
//! );
//! client.sign_in(UserId::new("user-1")?);
//!
//! let quizzes = client.load().await;
//! client.save(quizzes).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod client;
pub mod config;
pub mod local;
pub mod remote;

pub use adapter::SliceAdapter;
pub use client::{ClientError, SaveOutcome, SyncClient, BACKUP_SUFFIX, PENDING_APPEND_SUFFIX};
pub use config::{ConfigError, SyncConfig};
pub use local::{FileLocalStore, LocalStore, LocalStoreError, MemoryLocalStore};
pub use remote::{
    HttpRemoteStore, MockRemoteStore, RecordedWrite, RemoteStore, StoreError, WriteMode,
};
