//! Delete one quiz or all of them.

use anyhow::{bail, Result};
use studysync_client::{LocalStore, RemoteStore};
use studysync_quiz::QuizManager;

use super::resolve;

/// Run the delete command.
///
/// Waits for the background write and fails if it did not reach the remote.
pub async fn run<R, L>(manager: &QuizManager<R, L>, key: &str) -> Result<()>
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    let quiz = resolve(manager, key)?;
    manager.delete(quiz.id.as_str())?;
    manager.flush().await;

    if let Some(failure) = manager.pending_failures().first() {
        bail!("Quiz #{} not deleted remotely: {}", quiz.quiz_number, failure.error);
    }

    println!("Deleted quiz #{} ({})", quiz.quiz_number, quiz.id);
    println!("{} quizzes remain", manager.len());
    Ok(())
}

/// Run the delete-all command.
pub async fn all<R, L>(manager: &QuizManager<R, L>, confirmed: bool) -> Result<()>
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    if !confirmed {
        bail!(
            "Refusing to delete {} quizzes without --yes",
            manager.len()
        );
    }
    let count = manager.len();
    manager.delete_all().await?;
    println!("Deleted {count} quizzes");
    Ok(())
}
