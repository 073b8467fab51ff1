//! Error types for sync-quiz.

use studysync_client::ClientError;
use studysync_types::QuizStatus;
use thiserror::Error;

/// Errors from quiz lifecycle operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// No quiz with this id.
    #[error("quiz not found: {0}")]
    NotFound(String),

    /// The operation would move a quiz backward in its lifecycle.
    #[error("invalid transition for quiz {id}: {from} -> {to}")]
    InvalidTransition {
        /// Quiz id.
        id: String,
        /// Current status.
        from: QuizStatus,
        /// Requested status.
        to: QuizStatus,
    },

    /// The sync client failed.
    #[error("sync error: {0}")]
    Client(#[from] ClientError),
}

impl ManagerError {
    /// Whether the failure came from connectivity rather than the request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ManagerError::Client(
                ClientError::Store(_)
                    | ClientError::Timeout
                    | ClientError::CircuitOpen
                    | ClientError::LoadInFlight
            )
        )
    }
}
