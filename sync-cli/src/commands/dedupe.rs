//! Remove duplicate quizzes.

use anyhow::Result;
use studysync_client::{LocalStore, RemoteStore};
use studysync_quiz::QuizManager;

/// Run the dedupe command.
pub async fn run<R, L>(manager: &QuizManager<R, L>) -> Result<usize>
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    let removed = manager.remove_duplicates().await?;
    if removed == 0 {
        println!("No duplicates found ({} quizzes)", manager.len());
    } else {
        println!(
            "Removed {removed} duplicates, {} quizzes renumbered 1..{}",
            manager.len(),
            manager.len()
        );
    }
    Ok(removed)
}
