//! Partial quiz updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use studysync_types::{Question, Quiz, QuizStatus};
use tracing::warn;

/// Fields to overwrite on a quiz. `None` leaves the field unchanged.
///
/// Used for autosave during a session (answers, flags, eliminations, cursor)
/// and for the caller-supplied part of a completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPatch {
    /// Replacement question list.
    pub questions: Option<Vec<Question>>,
    /// Replacement answer map.
    pub user_answers: Option<BTreeMap<String, String>>,
    /// Current question cursor.
    pub current_question_index: Option<usize>,
    /// Replacement flag list.
    pub flagged_questions: Option<Vec<String>>,
    /// Replacement elimination map.
    pub eliminated_options: Option<BTreeMap<String, Vec<String>>>,
    /// Elimination tool toggle.
    pub elimination_mode: Option<bool>,
    /// New status. Ignored when it would move the quiz backward.
    pub status: Option<QuizStatus>,
    /// Category summary.
    pub categories: Option<String>,
    /// Session start.
    pub start_time: Option<DateTime<Utc>>,
    /// Scheduled date.
    pub planned_date: Option<DateTime<Utc>>,
    /// Seconds spent.
    pub time_spent: Option<u64>,
    /// Percentage score.
    pub score: Option<u32>,
    /// Correct answer count.
    pub correct_answers: Option<u32>,
    /// Scored question count.
    pub total_questions: Option<u32>,
}

impl QuizPatch {
    /// Patch recording one answer on top of the quiz's current answers.
    pub fn answer(quiz: &Quiz, question_id: &str, answer: &str) -> Self {
        let mut answers = quiz.user_answers.clone();
        answers.insert(question_id.to_string(), answer.to_string());
        Self {
            user_answers: Some(answers),
            ..Self::default()
        }
    }

    /// Patch toggling the review flag on one question.
    pub fn toggle_flag(quiz: &Quiz, question_id: &str) -> Self {
        let mut flagged = quiz.flagged_questions.clone();
        if let Some(pos) = flagged.iter().position(|id| id == question_id) {
            flagged.remove(pos);
        } else {
            flagged.push(question_id.to_string());
        }
        Self {
            flagged_questions: Some(flagged),
            ..Self::default()
        }
    }

    /// Patch toggling one eliminated choice on one question.
    pub fn toggle_elimination(quiz: &Quiz, question_id: &str, option: &str) -> Self {
        let mut eliminated = quiz.eliminated_options.clone();
        let choices = eliminated.entry(question_id.to_string()).or_default();
        if let Some(pos) = choices.iter().position(|o| o == option) {
            choices.remove(pos);
        } else {
            choices.push(option.to_string());
        }
        if choices.is_empty() {
            eliminated.remove(question_id);
        }
        Self {
            eliminated_options: Some(eliminated),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch in place.
    ///
    /// A backward status change is skipped with a warning; every other field
    /// still applies. Returns `false` when the status was skipped.
    pub fn apply(&self, quiz: &mut Quiz) -> bool {
        let mut status_applied = true;
        if let Some(status) = self.status {
            if quiz.status.can_advance_to(status) {
                quiz.status = status;
            } else {
                warn!(
                    quiz = %quiz.id,
                    from = %quiz.status,
                    to = %status,
                    "ignoring backward status change"
                );
                status_applied = false;
            }
        }

        if let Some(questions) = &self.questions {
            quiz.questions = questions.clone();
        }
        if let Some(answers) = &self.user_answers {
            quiz.user_answers = answers.clone();
        }
        if let Some(index) = self.current_question_index {
            quiz.current_question_index = index;
        }
        if let Some(flagged) = &self.flagged_questions {
            quiz.flagged_questions = flagged.clone();
        }
        if let Some(eliminated) = &self.eliminated_options {
            quiz.eliminated_options = eliminated.clone();
        }
        if let Some(mode) = self.elimination_mode {
            quiz.elimination_mode = mode;
        }
        if let Some(categories) = &self.categories {
            quiz.categories = categories.clone();
        }
        if let Some(start) = self.start_time {
            quiz.start_time = Some(start);
        }
        if let Some(planned) = self.planned_date {
            quiz.planned_date = Some(planned);
        }
        if let Some(spent) = self.time_spent {
            quiz.time_spent = spent;
        }
        if let Some(score) = self.score {
            quiz.score = Some(score);
        }
        if let Some(correct) = self.correct_answers {
            quiz.correct_answers = Some(correct);
        }
        if let Some(total) = self.total_questions {
            quiz.total_questions = Some(total);
        }

        quiz.last_updated = Utc::now();
        status_applied
    }
}
