//! focusnotes-core - Core library for FocusNotes
//!
//! This crate contains the backend client, note access layer, session
//! lifecycle, and editor state machine shared by every FocusNotes front end.

pub mod backend;
pub mod config;
pub mod editor;
pub mod error;
pub mod models;
pub mod notes;
pub mod session;

pub use error::{Error, Result};
pub use models::{Folder, FolderId, Note, NoteId, NotePatch};
