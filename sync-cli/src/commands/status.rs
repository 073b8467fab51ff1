//! Show sync status.

use std::fmt::Write as _;
use std::path::Path;
use studysync_client::{LocalStore, RemoteStore};
use studysync_quiz::QuizManager;

use crate::config::CliConfig;

/// Run the status command.
pub fn run<R, L>(config: &CliConfig, data_dir: &Path, manager: &QuizManager<R, L>)
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    print!("{}", render(config, data_dir, manager));
}

/// Render configuration, quiz counts and client health.
pub fn render<R, L>(config: &CliConfig, data_dir: &Path, manager: &QuizManager<R, L>) -> String
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    let mut out = String::new();
    let _ = writeln!(out, "=== studysync status ===");
    let _ = writeln!(out);

    let _ = writeln!(out, "Account:");
    let _ = writeln!(out, "  User:     {}", config.user);
    let _ = writeln!(out, "  Endpoint: {}", config.endpoint);
    let _ = writeln!(out, "  Data dir: {}", data_dir.display());
    let _ = writeln!(out);

    let _ = writeln!(out, "Quizzes:");
    let _ = writeln!(out, "  Total:       {}", manager.len());
    let _ = writeln!(out, "  Planned:     {}", manager.planned().len());
    let _ = writeln!(out, "  In progress: {}", manager.in_progress().len());
    let _ = writeln!(out, "  Completed:   {}", manager.completed().len());
    let _ = writeln!(out);

    let client = manager.client();
    let breaker = client.breaker_state();
    let _ = writeln!(out, "Connection:");
    if breaker.open_until.is_some() {
        let _ = writeln!(
            out,
            "  Status: OFFLINE (breaker open after {} failures)",
            breaker.consecutive_failures
        );
    } else {
        let _ = writeln!(
            out,
            "  Status: ONLINE ({} recent failures)",
            breaker.consecutive_failures
        );
    }
    if let Some(error) = client.last_error() {
        let _ = writeln!(out, "  Last error: {error}");
    }

    let failures = manager.pending_failures();
    if !failures.is_empty() {
        let _ = writeln!(out, "  Unsynced changes: {}", failures.len());
        for failure in &failures {
            let _ = writeln!(
                out,
                "    [{}] {}: {}",
                failure.at.format("%H:%M:%S"),
                failure.operation,
                failure.error
            );
        }
    }

    out
}
