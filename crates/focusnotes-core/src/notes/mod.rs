//! Note access layer.
//!
//! Maps create/update/delete/list intents onto the backend's document
//! operations against the notes collection. There is no validation, caching
//! or retrying here; backend errors propagate to the caller as-is.
//!
//! Concurrent writers follow last-write-wins in arrival order at the backend.
//! [`NoteService::update_if_unchanged`] opts into a client-side revision
//! check instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{Backend, Document, DocumentData};
use crate::config::CollectionRef;
use crate::error::{Error, Result};
use crate::models::{FolderId, Note, NoteId, NotePatch};

const TITLE_FIELD: &str = "FileTitle";
const CONTENT_FIELD: &str = "FileContent";
const FOLDER_FIELD: &str = "FolderID";

/// Stored document shape of a note.
#[derive(Debug, Serialize, Deserialize)]
struct NoteFields {
    #[serde(rename = "FileTitle", default)]
    title: Option<String>,
    #[serde(rename = "FileContent", default)]
    content: Option<String>,
    #[serde(rename = "FolderID", default)]
    folder_id: Option<FolderId>,
}

fn note_from_document(document: Document) -> Result<Note> {
    let fields: NoteFields = serde_json::from_value(Value::Object(document.data))?;
    Ok(Note {
        id: NoteId::new(document.id),
        title: fields.title.unwrap_or_default(),
        content: fields.content.unwrap_or_default(),
        folder_id: fields.folder_id.unwrap_or_default(),
        created_at: document.created_at,
        updated_at: document.updated_at,
    })
}

fn patch_to_data(patch: &NotePatch) -> DocumentData {
    let mut data = DocumentData::new();
    if let Some(title) = &patch.title {
        data.insert(TITLE_FIELD.to_string(), Value::from(title.as_str()));
    }
    if let Some(content) = &patch.content {
        data.insert(CONTENT_FIELD.to_string(), Value::from(content.as_str()));
    }
    if let Some(folder_id) = patch.folder_id {
        data.insert(FOLDER_FIELD.to_string(), Value::from(folder_id.get()));
    }
    data
}

/// Note operations bound to one database/collection pair.
pub struct NoteService<B: Backend + ?Sized> {
    backend: Arc<B>,
    collection: CollectionRef,
}

impl<B: Backend + ?Sized> Clone for NoteService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            collection: self.collection.clone(),
        }
    }
}

impl<B: Backend + ?Sized> NoteService<B> {
    pub const fn new(backend: Arc<B>, collection: CollectionRef) -> Self {
        Self {
            backend,
            collection,
        }
    }

    /// Create a note. An empty title is accepted at this layer.
    pub async fn create(&self, title: &str, content: &str, folder_id: FolderId) -> Result<Note> {
        let patch = NotePatch::content(content)
            .with_title(title)
            .with_folder(folder_id);
        let document = self
            .backend
            .create_document(&self.collection, patch_to_data(&patch))
            .await?;
        let note = note_from_document(document)?;
        tracing::debug!("Created note {} in folder {}", note.id, note.folder_id);
        Ok(note)
    }

    /// Send only the fields present in `patch`. Last write wins.
    pub async fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<Note> {
        let document = self
            .backend
            .update_document(&self.collection, id.as_str(), patch_to_data(patch))
            .await?;
        note_from_document(document)
    }

    /// Like [`Self::update`], but fails with [`Error::Conflict`] when the
    /// stored revision no longer matches `expected_revision`.
    ///
    /// The check and the write are two requests, so a writer landing between
    /// them still wins.
    pub async fn update_if_unchanged(
        &self,
        id: &NoteId,
        patch: &NotePatch,
        expected_revision: &str,
    ) -> Result<Note> {
        let current = self.get(id).await?;
        let actual = current.revision().unwrap_or_default();
        if actual != expected_revision {
            tracing::warn!(
                "Rejecting stale write to note {}: expected {}, found {}",
                id,
                expected_revision,
                actual
            );
            return Err(Error::Conflict {
                id: id.clone(),
                expected: expected_revision.to_string(),
                actual: actual.to_string(),
            });
        }
        self.update(id, patch).await
    }

    pub async fn get(&self, id: &NoteId) -> Result<Note> {
        let document = self
            .backend
            .get_document(&self.collection, id.as_str())
            .await?;
        note_from_document(document)
    }

    pub async fn delete(&self, id: &NoteId) -> Result<()> {
        self.backend
            .delete_document(&self.collection, id.as_str())
            .await?;
        tracing::debug!("Deleted note {}", id);
        Ok(())
    }

    /// All notes visible to the current session, in backend order.
    pub async fn list(&self) -> Result<Vec<Note>> {
        self.backend
            .list_documents(&self.collection)
            .await?
            .into_iter()
            .map(note_from_document)
            .collect()
    }
}
