//! Async driver for [`EditorState`].

use std::sync::Arc;

use tokio::sync::Mutex;

use super::autosave::{SaveMode, SaveScheduler};
use super::draft::{DraftRecord, DraftStore};
use super::{validate_document_name, EditorState};
use crate::backend::Backend;
use crate::models::{FolderId, Note, NoteId, NotePatch};
use crate::notes::NoteService;
use crate::{Error, Result};

/// What happens to unsaved edits when the selection moves away from a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchPolicy {
    /// Save the draft before switching
    #[default]
    Flush,
    /// Drop the draft
    Discard,
}

/// Everything a save needs, cloneable into a scheduled task.
struct Saver<B: Backend + ?Sized> {
    notes: NoteService<B>,
    state: Arc<Mutex<EditorState>>,
    drafts: Option<Arc<dyn DraftStore>>,
}

impl<B: Backend + ?Sized> Clone for Saver<B> {
    fn clone(&self) -> Self {
        Self {
            notes: self.notes.clone(),
            state: Arc::clone(&self.state),
            drafts: self.drafts.clone(),
        }
    }
}

impl<B: Backend + ?Sized> Saver<B> {
    async fn save(&self, note_id: NoteId, content: String, version: u64) -> Result<Note> {
        self.state.lock().await.mark_saving(&note_id, version);

        let patch = NotePatch::content(content);
        match self.notes.update(&note_id, &patch).await {
            Ok(note) => {
                tracing::debug!("Saved note: {}", note_id);
                self.state.lock().await.mark_saved(&note, version);
                if let Some(content) = patch.content.as_deref() {
                    self.clear_mirror_matching(&note_id, Some(content));
                }
                Ok(note)
            }
            Err(error) => {
                self.state
                    .lock()
                    .await
                    .mark_failed(&note_id, version, error.to_string());
                Err(error)
            }
        }
    }

    fn write_mirror(&self, note_id: &NoteId, content: &str) {
        let Some(drafts) = &self.drafts else {
            return;
        };
        let record = DraftRecord {
            note_id: note_id.clone(),
            content: content.to_string(),
            saved_at: chrono::Utc::now().timestamp_millis(),
        };
        if let Err(error) = drafts.save(&record) {
            tracing::warn!("Failed to mirror draft locally: {}", error);
        }
    }

    /// Clear the mirror if it holds a draft for `note_id` (and, when given,
    /// exactly `content`).
    fn clear_mirror_matching(&self, note_id: &NoteId, content: Option<&str>) {
        let Some(drafts) = &self.drafts else {
            return;
        };
        let matches = match drafts.load() {
            Ok(Some(record)) => {
                &record.note_id == note_id
                    && content.is_none_or(|content| record.content == content)
            }
            Ok(None) => false,
            Err(error) => {
                tracing::warn!("Failed to read draft mirror: {}", error);
                false
            }
        };
        if matches {
            if let Err(error) = drafts.clear() {
                tracing::warn!("Failed to clear draft mirror: {}", error);
            }
        }
    }

    /// A mirrored draft for the loaded note wins over the fetched content.
    fn reconcile_mirror(&self, state: &mut EditorState) {
        let Some(drafts) = &self.drafts else {
            return;
        };
        let record = match drafts.load() {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(error) => {
                tracing::warn!("Ignoring unreadable draft mirror: {}", error);
                return;
            }
        };
        if state.current_note_id() != Some(&record.note_id)
            || state.status().has_unsaved_changes()
        {
            return;
        }
        if record.content == state.draft() {
            self.clear_mirror_matching(&record.note_id, None);
            return;
        }
        tracing::info!("Restoring unsaved draft for note {}", record.note_id);
        state.restore_draft(record.content);
    }
}

/// Owns the editor state and routes every edit through the note service.
pub struct EditorController<B: Backend + ?Sized> {
    saver: Saver<B>,
    scheduler: SaveScheduler,
    mode: SaveMode,
    policy: SwitchPolicy,
}

impl<B: Backend + ?Sized + 'static> EditorController<B> {
    pub fn new(notes: NoteService<B>) -> Self {
        Self {
            saver: Saver {
                notes,
                state: Arc::new(Mutex::new(EditorState::new())),
                drafts: None,
            },
            scheduler: SaveScheduler::new(),
            mode: SaveMode::default(),
            policy: SwitchPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_save_mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn with_switch_policy(mut self, policy: SwitchPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_draft_store(mut self, drafts: Arc<dyn DraftStore>) -> Self {
        self.saver.drafts = Some(drafts);
        self
    }

    pub const fn notes(&self) -> &NoteService<B> {
        &self.saver.notes
    }

    /// Copy of the current editor state.
    pub async fn snapshot(&self) -> EditorState {
        self.saver.state.lock().await.clone()
    }

    /// Fetch all notes and regroup them into folders.
    pub async fn refresh(&self) -> Result<()> {
        let notes = self.saver.notes.list().await?;
        let mut state = self.saver.state.lock().await;
        state.apply_fetch(&notes);
        self.saver.reconcile_mirror(&mut state);
        tracing::debug!(
            "Loaded {} notes in {} folders",
            notes.len(),
            state.folders().len()
        );
        Ok(())
    }

    /// Switch to a folder and its first note. Returns `false` for an
    /// unknown folder.
    pub async fn select_folder(&self, folder_id: FolderId) -> Result<bool> {
        if !self.saver.state.lock().await.has_folder(folder_id) {
            return Ok(false);
        }
        self.leave_current().await?;

        let mut state = self.saver.state.lock().await;
        let found = state.select_folder(folder_id);
        self.saver.reconcile_mirror(&mut state);
        Ok(found)
    }

    /// Switch to a note. Returns `false` for an unknown id.
    pub async fn select_document(&self, note_id: &NoteId) -> Result<bool> {
        {
            let state = self.saver.state.lock().await;
            if state.find_note(note_id).is_none() {
                return Ok(false);
            }
            if state.current_note_id() == Some(note_id) {
                return Ok(true);
            }
        }
        self.leave_current().await?;

        let mut state = self.saver.state.lock().await;
        let found = state.select_note(note_id);
        self.saver.reconcile_mirror(&mut state);
        Ok(found)
    }

    /// Replace the draft of the selected note and persist it according to
    /// the save mode. Only immediate mode reports save errors here; others
    /// surface them through the save status.
    pub async fn edit(&self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        let (note_id, version) = {
            let mut state = self.saver.state.lock().await;
            let Some(note_id) = state.current_note_id().cloned() else {
                return Err(Error::InvalidInput("No note is selected".to_string()));
            };
            (note_id, state.edit(content.clone()))
        };
        self.saver.write_mirror(&note_id, &content);

        match self.mode {
            SaveMode::Manual => Ok(()),
            SaveMode::Immediate => {
                self.scheduler.cancel();
                self.saver.save(note_id, content, version).await.map(|_| ())
            }
            SaveMode::Debounced(delay) => {
                let saver = self.saver.clone();
                self.scheduler
                    .schedule(note_id.clone(), delay, move || async move {
                        if let Err(error) = saver.save(note_id.clone(), content, version).await {
                            tracing::error!("Failed to auto-save note {}: {}", note_id, error);
                        }
                    });
                Ok(())
            }
        }
    }

    /// Save the current draft now, cancelling any scheduled save. Returns
    /// `None` when there was nothing to save.
    pub async fn save_now(&self) -> Result<Option<Note>> {
        self.scheduler.cancel();
        let pending = {
            let state = self.saver.state.lock().await;
            if state.status().has_unsaved_changes() {
                state
                    .current_note_id()
                    .cloned()
                    .map(|id| (id, state.draft().to_string(), state.draft_version()))
            } else {
                None
            }
        };

        match pending {
            Some((note_id, content, version)) => {
                self.saver.save(note_id, content, version).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Create a note in an existing folder, select it, and reload the list.
    pub async fn create_document(&self, name: &str, folder_id: FolderId) -> Result<Note> {
        let name = validate_document_name(name)?;
        if !self.saver.state.lock().await.has_folder(folder_id) {
            return Err(Error::InvalidInput(format!(
                "Folder {folder_id} does not exist"
            )));
        }
        self.leave_current().await?;

        let note = self.saver.notes.create(name, "", folder_id).await?;
        tracing::info!("Created note {} in folder {}", note.id, folder_id);
        self.saver.state.lock().await.insert_created(note.clone());
        self.refresh().await?;
        Ok(note)
    }

    /// Add an empty local folder. Returns `None` for unusable input.
    pub async fn create_folder(&self, input: &str) -> Option<FolderId> {
        self.saver.state.lock().await.create_folder(input)
    }

    /// Apply the switch policy to the note being left.
    async fn leave_current(&self) -> Result<()> {
        let (note_id, dirty) = {
            let state = self.saver.state.lock().await;
            (
                state.current_note_id().cloned(),
                state.status().has_unsaved_changes(),
            )
        };
        let Some(note_id) = note_id else {
            return Ok(());
        };
        self.scheduler.cancel_for(&note_id);
        if !dirty {
            return Ok(());
        }

        match self.policy {
            SwitchPolicy::Flush => {
                self.save_now().await?;
            }
            SwitchPolicy::Discard => {
                tracing::warn!("Discarding unsaved edits for note {}", note_id);
                self.saver.clear_mirror_matching(&note_id, None);
                self.saver.state.lock().await.discard_draft();
            }
        }
        Ok(())
    }
}
