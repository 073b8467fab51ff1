//! Error types for studysync data model.

use thiserror::Error;

/// Errors raised while constructing or parsing model types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// A user id was empty or whitespace.
    #[error("user id must not be empty")]
    EmptyUserId,

    /// A data type name did not match any known slice.
    #[error("unknown data type: {0}")]
    UnknownDataType(String),
}
