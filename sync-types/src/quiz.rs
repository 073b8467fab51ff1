//! Quiz records persisted in the [`DataType::Quizzes`](crate::DataType) slice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::ids::{normalize_id, string_or_number};
use crate::{Keyed, QuizId};

/// Lifecycle status of a quiz.
///
/// Ordered: a quiz may only move forward through these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    /// Scheduled for a future session.
    Planned,
    /// Session started, answers being collected.
    InProgress,
    /// Finished and scored. Terminal.
    Completed,
}

impl QuizStatus {
    /// Whether moving from `self` to `next` keeps the status monotonic.
    ///
    /// Staying put is allowed. Planned → Completed is an implicit start
    /// followed by a finish.
    pub fn can_advance_to(self, next: QuizStatus) -> bool {
        next >= self
    }

    /// Stable name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::Planned => "planned",
            QuizStatus::InProgress => "in_progress",
            QuizStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question inside a quiz or the question bank.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Question {
    /// Question id. Legacy records may hold a number.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Question stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    /// Answer choices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// The correct choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Explanation shown after answering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Subject category, used for the quiz summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// The answer the user picked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    /// Whether `user_answer` was correct.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    /// Passage illustration (URL, SVG literal, or inline data).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage_image: Option<String>,
    /// Explanation illustration (URL, SVG literal, or inline data).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation_image: Option<String>,
    /// Any other fields carried by the content source.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    /// Create a question with just an id and stem.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question_text: Some(text.into()),
            ..Self::default()
        }
    }
}

impl Keyed for Question {
    fn key(&self) -> String {
        normalize_id(&self.id)
    }
}

/// A quiz: a numbered session over a list of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Client-generated id.
    pub id: QuizId,
    /// Display number, contiguous from 1 across all of a user's quizzes.
    pub quiz_number: u32,
    /// The questions, in presentation order.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Question id → chosen answer.
    #[serde(default)]
    pub user_answers: BTreeMap<String, String>,
    /// Index of the question the user is on.
    #[serde(default)]
    pub current_question_index: usize,
    /// Question ids flagged for review.
    #[serde(default)]
    pub flagged_questions: Vec<String>,
    /// Question id → eliminated choices.
    #[serde(default)]
    pub eliminated_options: BTreeMap<String, Vec<String>>,
    /// Whether the elimination tool is active.
    #[serde(default)]
    pub elimination_mode: bool,
    /// Lifecycle status.
    pub status: QuizStatus,
    /// Category summary ("Mixed" when heterogeneous).
    #[serde(default)]
    pub categories: String,
    /// When the session started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// When a planned quiz is scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<DateTime<Utc>>,
    /// When the quiz was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Completion date, shown in history views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// Last local modification.
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
    /// Seconds spent in the session.
    #[serde(default)]
    pub time_spent: u64,
    /// Percentage score (completed only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Number of correct answers (completed only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<u32>,
    /// Number of questions scored (completed only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
}

impl Quiz {
    /// Create an empty quiz shell with the given number and status.
    pub fn new(quiz_number: u32, status: QuizStatus) -> Self {
        Self {
            id: QuizId::new(),
            quiz_number,
            questions: Vec::new(),
            user_answers: BTreeMap::new(),
            current_question_index: 0,
            flagged_questions: Vec::new(),
            eliminated_options: BTreeMap::new(),
            elimination_mode: false,
            status,
            categories: String::new(),
            start_time: None,
            planned_date: None,
            end_time: None,
            date: None,
            last_updated: Utc::now(),
            time_spent: 0,
            score: None,
            correct_answers: None,
            total_questions: None,
        }
    }

    /// Whether the quiz reached its terminal state.
    pub fn is_completed(&self) -> bool {
        self.status == QuizStatus::Completed
    }
}

impl Keyed for Quiz {
    fn key(&self) -> String {
        self.id.normalized()
    }
}
