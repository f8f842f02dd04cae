//! Error types for focusnotes-core

use thiserror::Error;

use crate::backend::BackendError;
use crate::models::NoteId;

/// Result type alias using focusnotes-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in focusnotes-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote backend error
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The note changed remotely since it was loaded
    #[error("Note {id} was modified remotely (expected revision {expected}, found {actual})")]
    Conflict {
        id: NoteId,
        expected: String,
        actual: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local key-value storage error
    #[error("Storage error: {0}")]
    Storage(String),
}
