//! # sync-quiz
//!
//! Quiz lifecycle manager for studysync.
//!
//! This crate wraps a `SyncClient<QuizList, R, L>` into [`QuizManager`],
//! which creates, updates, finishes and deletes quizzes while keeping
//! numbering contiguous and never moving a quiz backward in its lifecycle.
//!
//! ## Design
//!
//! - The manager owns no storage; every write goes through the sync client
//! - A local snapshot serves synchronous reads between round-trips
//! - Background writes are tracked; failures stay visible until reconciled
//! - Thin over the pure rules in sync-core (numbering, scoring, sanitizing)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod background;
pub mod error;
pub mod manager;
pub mod patch;

pub use background::PersistFailure;
pub use error::ManagerError;
pub use manager::{QuizClient, QuizManager};
pub use patch::QuizPatch;
