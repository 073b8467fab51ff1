//! # sync-types
//!
//! Shared data model for studysync.
//!
//! This crate provides the foundational types used across all studysync crates:
//! - [`UserId`], [`QuizId`], [`SliceKey`] - Identity and addressing types
//! - [`DataType`] - The fixed set of per-user slices
//! - [`SliceData`], [`SliceState`] - What a slice holds and how it merges
//! - [`Quiz`], [`Question`], [`QuizStatus`] - The quiz record persisted in the quiz slice
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod data_type;
mod error;
mod ids;
mod quiz;
mod records;
mod slice;

pub use data_type::DataType;
pub use error::TypesError;
pub use ids::{normalize_id, QuizId, SliceKey, UserId};
pub use quiz::{Question, Quiz, QuizStatus};
pub use records::{AnswerRecord, CalendarEvent};
pub use slice::{Keyed, SliceData, SliceState};

/// Value of the [`DataType::Quizzes`] slice.
pub type QuizList = Vec<Quiz>;

/// Value of the [`DataType::QuestionBank`] slice.
pub type QuestionBank = Vec<Question>;

/// Value of the [`DataType::AnswerHistory`] slice, keyed by question id.
pub type AnswerHistory = std::collections::BTreeMap<String, Vec<AnswerRecord>>;

/// Value of the [`DataType::CalendarEvents`] slice.
pub type CalendarEvents = Vec<CalendarEvent>;
