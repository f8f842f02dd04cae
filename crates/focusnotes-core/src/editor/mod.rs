//! Editor state: folders, selection, and the draft being typed.
//!
//! [`EditorState`] is plain data with synchronous transitions.
//! [`EditorController`] drives it against the note service and owns save
//! scheduling and the local draft mirror.

mod autosave;
mod controller;
mod draft;

pub use autosave::{SaveMode, SaveScheduler, DEFAULT_DEBOUNCE};
pub use controller::{EditorController, SwitchPolicy};
pub use draft::{DraftRecord, DraftStore, FileDraftStore, MemoryDraftStore, DRAFT_KEY};

use crate::models::{group_by_folder, Folder, FolderId, Note, NoteId};
use crate::{Error, Result};

/// Where the current draft stands relative to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Clean,
    Dirty,
    Saving,
    Failed(String),
}

impl SaveStatus {
    /// The draft holds text the backend has not acknowledged.
    #[must_use]
    pub const fn has_unsaved_changes(&self) -> bool {
        !matches!(self, Self::Clean)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    folders: Vec<Folder>,
    current_folder: Option<FolderId>,
    current_note: Option<NoteId>,
    draft: String,
    status: SaveStatus,
    /// Bumped on every edit so a finishing save knows whether it is stale.
    draft_version: u64,
}

impl EditorState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    #[must_use]
    pub const fn current_folder(&self) -> Option<FolderId> {
        self.current_folder
    }

    #[must_use]
    pub const fn current_note_id(&self) -> Option<&NoteId> {
        self.current_note.as_ref()
    }

    #[must_use]
    pub fn current_note(&self) -> Option<&Note> {
        let id = self.current_note.as_ref()?;
        self.find_note(id)
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    #[must_use]
    pub const fn status(&self) -> &SaveStatus {
        &self.status
    }

    #[must_use]
    pub const fn draft_version(&self) -> u64 {
        self.draft_version
    }

    #[must_use]
    pub fn find_note(&self, id: &NoteId) -> Option<&Note> {
        self.folders
            .iter()
            .flat_map(|folder| folder.notes.iter())
            .find(|note| &note.id == id)
    }

    fn find_note_mut(&mut self, id: &NoteId) -> Option<&mut Note> {
        self.folders
            .iter_mut()
            .flat_map(|folder| folder.notes.iter_mut())
            .find(|note| &note.id == id)
    }

    fn load_note(&mut self, note: Option<(FolderId, NoteId, String)>) {
        match note {
            Some((folder_id, note_id, content)) => {
                self.current_folder = Some(folder_id);
                self.current_note = Some(note_id);
                self.draft = content;
            }
            None => {
                self.current_note = None;
                self.draft.clear();
            }
        }
        self.status = SaveStatus::Clean;
    }

    fn first_note_of(folder: Option<&Folder>) -> Option<(FolderId, NoteId, String)> {
        folder
            .and_then(Folder::first_note)
            .map(|note| (note.folder_id, note.id.clone(), note.content.clone()))
    }

    /// Replace the folder tree with a freshly fetched note list.
    ///
    /// Locally created empty folders are dropped. When nothing is selected,
    /// or a clean selected note is gone, the first note of the first folder
    /// is selected. A selected note's draft is reloaded from the fetch only
    /// while it has no unsaved changes, and a missing note with unsaved
    /// changes stays selected.
    pub fn apply_fetch(&mut self, notes: &[Note]) {
        self.folders = group_by_folder(notes);

        let selected = self
            .current_note
            .as_ref()
            .and_then(|id| self.find_note(id))
            .map(|note| (note.folder_id, note.content.clone()));

        match selected {
            Some((folder_id, content)) => {
                self.current_folder = Some(folder_id);
                if !self.status.has_unsaved_changes() {
                    self.draft = content;
                }
            }
            None if self.current_note.is_some() && self.status.has_unsaved_changes() => {}
            None => {
                let first = Self::first_note_of(self.folders.first());
                if first.is_none() {
                    self.current_folder = self.folders.first().map(|folder| folder.id);
                }
                self.load_note(first);
            }
        }
    }

    /// Select a folder and its first note. Returns `false` for an unknown
    /// folder id.
    pub fn select_folder(&mut self, folder_id: FolderId) -> bool {
        let Some(folder) = self.folders.iter().find(|folder| folder.id == folder_id) else {
            return false;
        };
        let first = Self::first_note_of(Some(folder));
        self.current_folder = Some(folder_id);
        self.load_note(first);
        true
    }

    /// Select a note and load its content. Returns `false` for an unknown id.
    pub fn select_note(&mut self, note_id: &NoteId) -> bool {
        let Some(note) = self.find_note(note_id) else {
            return false;
        };
        let loaded = (note.folder_id, note.id.clone(), note.content.clone());
        self.load_note(Some(loaded));
        true
    }

    /// Add a note created on the backend and select it with an empty draft.
    pub fn insert_created(&mut self, note: Note) {
        let folder_id = note.folder_id;
        let note_id = note.id.clone();
        match self.folders.iter_mut().find(|folder| folder.id == folder_id) {
            Some(folder) => folder.notes.push(note),
            None => {
                let mut folder = Folder::new(folder_id);
                folder.notes.push(note);
                self.folders.push(folder);
            }
        }
        self.load_note(Some((folder_id, note_id, String::new())));
    }

    /// Replace the draft with typed text. Returns the new draft version.
    pub fn edit(&mut self, content: impl Into<String>) -> u64 {
        self.draft = content.into();
        self.draft_version += 1;
        self.status = SaveStatus::Dirty;
        self.draft_version
    }

    /// Put back a draft recovered from the local mirror.
    pub fn restore_draft(&mut self, content: String) -> u64 {
        self.edit(content)
    }

    /// Forget unsaved changes and reload the backend copy.
    pub fn discard_draft(&mut self) {
        let content = self.current_note().map(|note| note.content.clone());
        self.draft = content.unwrap_or_default();
        self.status = SaveStatus::Clean;
    }

    pub(crate) fn mark_saving(&mut self, note_id: &NoteId, version: u64) {
        if self.is_current(note_id, version) {
            self.status = SaveStatus::Saving;
        }
    }

    /// Record a backend acknowledgement. The status only returns to clean
    /// when no edit happened while the save was in flight.
    pub(crate) fn mark_saved(&mut self, saved: &Note, version: u64) {
        if let Some(note) = self.find_note_mut(&saved.id) {
            *note = saved.clone();
        }
        if self.is_current(&saved.id, version) {
            self.status = SaveStatus::Clean;
        }
    }

    pub(crate) fn mark_failed(&mut self, note_id: &NoteId, version: u64, message: String) {
        if self.is_current(note_id, version) {
            self.status = SaveStatus::Failed(message);
        }
    }

    fn is_current(&self, note_id: &NoteId, version: u64) -> bool {
        self.current_note.as_ref() == Some(note_id) && self.draft_version == version
    }

    /// Append an empty folder from user input. Blank, non-numeric, or
    /// already present ids are ignored.
    pub fn create_folder(&mut self, input: &str) -> Option<FolderId> {
        let folder_id = input.parse::<FolderId>().ok()?;
        if self.folders.iter().any(|folder| folder.id == folder_id) {
            return None;
        }
        self.folders.push(Folder::new(folder_id));
        Some(folder_id)
    }

    #[must_use]
    pub fn has_folder(&self, folder_id: FolderId) -> bool {
        self.folders.iter().any(|folder| folder.id == folder_id)
    }
}

/// A new document needs a non-blank name.
pub fn validate_document_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Document name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn note(id: &str, folder: i64, content: &str) -> Note {
        Note {
            id: NoteId::new(id),
            title: id.to_uppercase(),
            content: content.to_string(),
            folder_id: FolderId::new(folder),
            created_at: None,
            updated_at: None,
        }
    }

    fn fetched() -> Vec<Note> {
        vec![note("a", 2, "alpha"), note("b", 1, "beta"), note("c", 2, "gamma")]
    }

    #[test]
    fn first_fetch_selects_first_note_of_first_folder() {
        let mut state = EditorState::new();
        state.apply_fetch(&fetched());

        assert_eq!(state.current_folder(), Some(FolderId::new(2)));
        assert_eq!(state.current_note_id(), Some(&NoteId::new("a")));
        assert_eq!(state.draft(), "alpha");
        assert_eq!(state.status(), &SaveStatus::Clean);
    }

    #[test]
    fn empty_fetch_clears_selection() {
        let mut state = EditorState::new();
        state.apply_fetch(&[]);
        assert!(state.current_note_id().is_none());
        assert!(state.current_folder().is_none());
        assert_eq!(state.draft(), "");
    }

    #[test]
    fn fetch_never_overwrites_dirty_draft() {
        let mut state = EditorState::new();
        state.apply_fetch(&fetched());
        state.edit("alpha, edited");

        let mut newer = fetched();
        newer[0].content = "alpha from elsewhere".to_string();
        state.apply_fetch(&newer);

        assert_eq!(state.draft(), "alpha, edited");
        assert_eq!(state.status(), &SaveStatus::Dirty);
    }

    #[test]
    fn fetch_reloads_clean_draft() {
        let mut state = EditorState::new();
        state.apply_fetch(&fetched());

        let mut newer = fetched();
        newer[0].content = "alpha v2".to_string();
        state.apply_fetch(&newer);

        assert_eq!(state.draft(), "alpha v2");
    }

    #[test]
    fn fetch_reselects_when_current_note_disappears() {
        let mut state = EditorState::new();
        state.apply_fetch(&fetched());
        state.select_note(&NoteId::new("b"));

        state.apply_fetch(&[note("c", 2, "gamma")]);
        assert_eq!(state.current_note_id(), Some(&NoteId::new("c")));
    }

    #[test]
    fn fetch_keeps_unsaved_note_that_disappeared() {
        let mut state = EditorState::new();
        state.apply_fetch(&fetched());
        state.select_note(&NoteId::new("b"));
        state.edit("unsaved work on b");

        state.apply_fetch(&[note("a", 2, "alpha")]);
        assert_eq!(state.current_note_id(), Some(&NoteId::new("b")));
        assert_eq!(state.draft(), "unsaved work on b");
        assert_eq!(state.status(), &SaveStatus::Dirty);
    }

    #[test]
    fn selecting_folder_loads_its_first_note() {
        let mut state = EditorState::new();
        state.apply_fetch(&fetched());

        assert!(state.select_folder(FolderId::new(1)));
        assert_eq!(state.current_note_id(), Some(&NoteId::new("b")));
        assert_eq!(state.draft(), "beta");
        assert!(!state.select_folder(FolderId::new(99)));
    }

    #[test]
    fn saves_finishing_after_new_edits_keep_draft_dirty() {
        let mut state = EditorState::new();
        state.apply_fetch(&fetched());
        let first = state.edit("one");
        state.mark_saving(&NoteId::new("a"), first);
        state.edit("one two");

        state.mark_saved(&note("a", 2, "one"), first);
        assert_eq!(state.status(), &SaveStatus::Dirty);
        assert_eq!(state.current_note().map(|n| n.content.as_str()), Some("one"));
    }

    #[test]
    fn created_folder_is_local_and_lost_on_fetch() {
        let mut state = EditorState::new();
        state.apply_fetch(&fetched());

        assert_eq!(state.create_folder(" 7 "), Some(FolderId::new(7)));
        assert_eq!(state.folders().last().map(|f| f.name.as_str()), Some("Folder 7"));
        assert_eq!(state.create_folder("7"), None);
        assert_eq!(state.create_folder(""), None);
        assert_eq!(state.create_folder("seven"), None);

        state.apply_fetch(&fetched());
        assert!(!state.has_folder(FolderId::new(7)));
    }

    #[test]
    fn document_names_must_not_be_blank() {
        assert_eq!(validate_document_name("  Todo ").unwrap(), "Todo");
        assert!(matches!(
            validate_document_name("   "),
            Err(Error::InvalidInput(_))
        ));
    }
}
