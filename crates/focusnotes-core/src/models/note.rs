//! Note model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::FolderId;

/// Opaque note identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this ID begins with the given prefix (used for short-ID lookups)
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note as held by the client. The backend owns the record; this is a
/// cached copy from the last fetch or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Backend-assigned identifier
    pub id: NoteId,
    /// Display title
    pub title: String,
    /// Plain text body
    pub content: String,
    /// Grouping key
    pub folder_id: FolderId,
    /// Backend creation stamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// Backend modification stamp, doubles as the revision for stale-write checks
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Note {
    /// Revision token of this copy, if the backend supplied one
    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }
}

/// Partial update: only the fields that are `Some` are sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub folder_id: Option<FolderId>,
}

impl NotePatch {
    /// Patch that replaces only the content
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn with_folder(mut self, folder_id: FolderId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(content: &str) -> Note {
        Note {
            id: NoteId::new("n1"),
            title: "Title".to_string(),
            content: content.to_string(),
            folder_id: FolderId::new(1),
            created_at: None,
            updated_at: Some("2024-01-01T00:00:00.000+00:00".to_string()),
        }
    }

    #[test]
    fn test_note_id_display_and_prefix() {
        let id = NoteId::new("65f0a1b2c3d4");
        assert_eq!(id.to_string(), "65f0a1b2c3d4");
        assert!(id.starts_with("65f0"));
        assert!(!id.starts_with("ff"));
    }

    #[test]
    fn test_note_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&NoteId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_revision_is_updated_stamp() {
        assert_eq!(
            note("body").revision(),
            Some("2024-01-01T00:00:00.000+00:00")
        );
    }

    #[test]
    fn test_patch_builders_set_only_named_fields() {
        let patch = NotePatch::content("new").with_folder(FolderId::new(4));
        assert_eq!(patch.content.as_deref(), Some("new"));
        assert_eq!(patch.folder_id, Some(FolderId::new(4)));
        assert_eq!(patch.title, None);
    }
}
