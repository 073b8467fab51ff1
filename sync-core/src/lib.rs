//! # sync-core
//!
//! Pure logic for studysync (no I/O, instant tests).
//!
//! This crate implements the resilience state machines and the quiz
//! bookkeeping rules without any network or disk I/O, enabling fast unit
//! tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. Clocks are passed in as `Instant` values rather than
//! read, so breaker and throttle behaviour is deterministic under test.
//!
//! The actual I/O (remote service, device-local store, timers) is performed
//! by `sync-client`, which consults these state machines around every call.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod breaker;
pub mod coalesce;
pub mod numbering;
pub mod sanitize;
pub mod throttle;

pub use backoff::BackoffPolicy;
pub use breaker::{BreakerState, CircuitBreaker, FailureOutcome};
pub use coalesce::{Admission, WriteCoalescer};
pub use numbering::{
    category_summary, compact_numbers, is_contiguous, next_number, renumber_after_delete,
    score_percent, MIXED_CATEGORY,
};
pub use sanitize::{sanitize_question, sanitize_questions, MAX_FIELD_BYTES, MAX_SVG_LITERAL_BYTES};
pub use throttle::LoadThrottle;
