//! Quiz numbering, scoring and summaries.
//!
//! Quiz numbers are display numbers that must stay contiguous from 1 across
//! all of a user's quizzes. Numbers are only reused through renumbering on
//! delete.

use studysync_types::{Question, Quiz};

/// Category label used when a quiz spans several categories.
pub const MIXED_CATEGORY: &str = "Mixed";

/// Next number to assign: highest existing number plus one, or 1.
pub fn next_number<'a, I>(quizzes: I) -> u32
where
    I: IntoIterator<Item = &'a Quiz>,
{
    quizzes
        .into_iter()
        .map(|q| q.quiz_number)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Close the gap left by deleting quiz number `deleted`.
///
/// Every quiz numbered above `deleted` moves down by one. Returns how many
/// quizzes were renumbered.
pub fn renumber_after_delete(quizzes: &mut [Quiz], deleted: u32) -> usize {
    let mut changed = 0;
    for quiz in quizzes.iter_mut().filter(|q| q.quiz_number > deleted) {
        quiz.quiz_number -= 1;
        changed += 1;
    }
    changed
}

/// Reassign numbers `1..=N`, ordered by current number then position.
///
/// Vector order is left unchanged.
pub fn compact_numbers(quizzes: &mut [Quiz]) {
    let mut order: Vec<usize> = (0..quizzes.len()).collect();
    order.sort_by_key(|&i| (quizzes[i].quiz_number, i));
    for (rank, index) in order.into_iter().enumerate() {
        quizzes[index].quiz_number = rank as u32 + 1;
    }
}

/// Whether the numbers form exactly `{1..N}` with no duplicates.
pub fn is_contiguous(quizzes: &[Quiz]) -> bool {
    let mut numbers: Vec<u32> = quizzes.iter().map(|q| q.quiz_number).collect();
    numbers.sort_unstable();
    numbers
        .iter()
        .enumerate()
        .all(|(i, &n)| n as usize == i + 1)
}

/// Percentage score, rounded to the nearest integer. 0 when `total` is 0.
pub fn score_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * f64::from(correct) / f64::from(total)).round() as u32
}

/// Category summary for a quiz: the first question's category when every
/// question shares it, otherwise [`MIXED_CATEGORY`].
pub fn category_summary(questions: &[Question]) -> String {
    let Some(first) = questions.first().and_then(|q| q.category.as_deref()) else {
        return MIXED_CATEGORY.to_string();
    };
    if questions
        .iter()
        .all(|q| q.category.as_deref() == Some(first))
    {
        first.to_string()
    } else {
        MIXED_CATEGORY.to_string()
    }
}
