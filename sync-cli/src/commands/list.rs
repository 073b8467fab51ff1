//! List quizzes and show one in full.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use studysync_client::{LocalStore, RemoteStore};
use studysync_quiz::QuizManager;
use studysync_types::{Quiz, QuizStatus};

use super::resolve;

/// Status filter accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    /// Scheduled quizzes.
    Planned,
    /// Quizzes with a session under way.
    InProgress,
    /// Finished quizzes.
    Completed,
}

impl From<StatusFilter> for QuizStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Planned => QuizStatus::Planned,
            StatusFilter::InProgress => QuizStatus::InProgress,
            StatusFilter::Completed => QuizStatus::Completed,
        }
    }
}

/// Run the list command.
pub fn run<R, L>(manager: &QuizManager<R, L>, filter: Option<StatusFilter>)
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    let quizzes = match filter {
        Some(status) => manager.by_status(status.into()),
        None => manager.all(),
    };
    print!("{}", render_list(&quizzes, Utc::now()));
}

/// Run the show command.
pub fn show<R, L>(manager: &QuizManager<R, L>, key: &str) -> Result<()>
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    let quiz = resolve(manager, key)?;
    let json = serde_json::to_string_pretty(&quiz).context("Failed to encode quiz")?;
    println!("{json}");
    Ok(())
}

/// Render quizzes as a table, one row per quiz.
pub fn render_list(quizzes: &[Quiz], now: DateTime<Utc>) -> String {
    if quizzes.is_empty() {
        return "No quizzes.\n".to_string();
    }
    let mut out = format!(
        "{:>4}  {:<11}  {:>9}  {:>5}  {:<14}  {}\n",
        "#", "STATUS", "ANSWERED", "SCORE", "UPDATED", "CATEGORIES"
    );
    for quiz in quizzes {
        out.push_str(&render_row(quiz, now));
        out.push('\n');
    }
    out
}

fn render_row(quiz: &Quiz, now: DateTime<Utc>) -> String {
    let answered = format!("{}/{}", quiz.user_answers.len(), quiz.questions.len());
    let score = quiz
        .score
        .map(|s| format!("{s}%"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>4}  {:<11}  {:>9}  {:>5}  {:<14}  {}",
        quiz.quiz_number,
        quiz.status,
        answered,
        score,
        format_age(quiz.last_updated, now),
        quiz.categories
    )
}

/// Format a timestamp relative to `now`.
pub fn format_age(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - ts).num_seconds().max(0);

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}
