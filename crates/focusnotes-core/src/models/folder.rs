//! Client-side folder grouping
//!
//! Folders are not persisted. They are derived from the flat note list on
//! every fetch, keyed by each note's integer folder id.

use std::collections::HashMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Note;

/// Integer grouping key typed in by the user
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FolderId(i64);

impl FolderId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A group of notes sharing a folder id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub notes: Vec<Note>,
}

impl Folder {
    /// Empty folder named from the fixed `"Folder {id}"` template
    #[must_use]
    pub fn new(id: FolderId) -> Self {
        Self {
            id,
            name: format!("Folder {id}"),
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn first_note(&self) -> Option<&Note> {
        self.notes.first()
    }
}

/// Group a flat note list by folder id.
///
/// Folders appear in the order their id is first seen; notes keep their
/// relative order inside each folder.
#[must_use]
pub fn group_by_folder(notes: &[Note]) -> Vec<Folder> {
    let mut folders: Vec<Folder> = Vec::new();
    let mut index: HashMap<FolderId, usize> = HashMap::new();

    for note in notes {
        let slot = *index.entry(note.folder_id).or_insert_with(|| {
            folders.push(Folder::new(note.folder_id));
            folders.len() - 1
        });
        folders[slot].notes.push(note.clone());
    }

    folders
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::NoteId;

    fn note(id: &str, folder: i64) -> Note {
        Note {
            id: NoteId::new(id),
            title: id.to_uppercase(),
            content: String::new(),
            folder_id: FolderId::new(folder),
            created_at: None,
            updated_at: None,
        }
    }

    fn membership(folders: &[Folder]) -> Vec<(i64, Vec<String>)> {
        folders
            .iter()
            .map(|folder| {
                (
                    folder.id.get(),
                    folder.notes.iter().map(|n| n.id.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let notes = vec![note("a", 3), note("b", 1), note("c", 3), note("d", 2)];
        let folders = group_by_folder(&notes);

        assert_eq!(
            membership(&folders),
            vec![
                (3, vec!["a".to_string(), "c".to_string()]),
                (1, vec!["b".to_string()]),
                (2, vec!["d".to_string()]),
            ]
        );
        assert_eq!(folders[0].name, "Folder 3");
    }

    #[test]
    fn grouping_is_idempotent() {
        let notes = vec![note("a", 5), note("b", 7), note("c", 5)];
        let first = group_by_folder(&notes);
        let second = group_by_folder(&notes);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_list_has_no_folders() {
        assert!(group_by_folder(&[]).is_empty());
    }

    #[test]
    fn folder_id_parses_trimmed_integers() {
        assert_eq!(" 42 ".parse::<FolderId>().unwrap(), FolderId::new(42));
        assert!("abc".parse::<FolderId>().is_err());
        assert!("".parse::<FolderId>().is_err());
    }
}
