use std::io;

use focusnotes_core::session::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] focusnotes_core::Error),
    #[error("{}", .0.user_message())]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Profile '{0}' is not signed in. Run `focusnotes auth login` first.")]
    NotSignedIn(String),
    #[error("Profile '{profile}' is already signed in as {email}. Run `focusnotes auth logout` first.")]
    AlreadySignedIn { profile: String, email: String },
    #[error("Note was not saved: {0}")]
    SaveFailed(String),
}

impl From<focusnotes_core::backend::BackendError> for CliError {
    fn from(error: focusnotes_core::backend::BackendError) -> Self {
        Self::Core(error.into())
    }
}
