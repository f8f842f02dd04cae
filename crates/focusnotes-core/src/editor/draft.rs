//! Local mirror of the draft being edited.
//!
//! A single record survives a crash or a lost connection. It only ever holds
//! text the backend has not acknowledged yet.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::models::NoteId;
use crate::{Error, Result};

/// Key the mirror record is stored under.
pub const DRAFT_KEY: &str = "focusnote_userNote";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub note_id: NoteId,
    pub content: String,
    /// Unix milliseconds of the edit that produced this record
    pub saved_at: i64,
}

pub trait DraftStore: Send + Sync {
    fn load(&self) -> Result<Option<DraftRecord>>;
    fn save(&self, record: &DraftRecord) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Mirror persisted as `<dir>/focusnote_userNote.json`.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{DRAFT_KEY}.json")),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self) -> Result<Option<DraftRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, record: &DraftRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                Error::Storage(format!(
                    "Failed to create draft directory {}: {}",
                    parent.display(),
                    error
                ))
            })?;
        }
        let serialized = serde_json::to_string(record)?;
        std::fs::write(&self.path, serialized)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    record: Mutex<Option<DraftRecord>>,
}

impl MemoryDraftStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(record: DraftRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }

    /// Current record without going through the trait.
    pub fn snapshot(&self) -> Option<DraftRecord> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self) -> Result<Option<DraftRecord>> {
        Ok(self.snapshot())
    }

    fn save(&self, record: &DraftRecord) -> Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_store_persists_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::in_dir(&dir.path().join("nested"));
        assert_eq!(store.load().unwrap(), None);

        let first = DraftRecord {
            note_id: NoteId::new("a"),
            content: "first".to_string(),
            saved_at: 1,
        };
        let second = DraftRecord {
            note_id: NoteId::new("b"),
            content: "second".to_string(),
            saved_at: 2,
        };
        store.save(&first).unwrap();
        store.save(&second).unwrap();

        assert!(store.path().ends_with("focusnote_userNote.json"));
        assert_eq!(store.load().unwrap(), Some(second));
    }

    #[test]
    fn clearing_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::in_dir(dir.path());
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::in_dir(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(Error::Serialization(_))));
    }
}
