//! Data models for FocusNotes

mod folder;
mod note;

pub use folder::{group_by_folder, Folder, FolderId};
pub use note::{Note, NoteId, NotePatch};
