use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use focusnotes_core::backend::{AppwriteBackend, Backend};
use focusnotes_core::config::BackendConfig;
use focusnotes_core::editor::{EditorController, EditorState, FileDraftStore, SaveMode};
use focusnotes_core::notes::NoteService;
use focusnotes_core::session::{Route, SessionContext, SessionPersistence, SessionState};
use focusnotes_core::{Folder, Note};
use serde::Serialize;

use crate::auth::SessionStore;
use crate::config_profiles::{default_data_dir, CliProfilesConfig};
use crate::error::CliError;

/// Refuse to show sign-in or register to a profile that is already signed
/// in, the same redirect the editor route applies.
pub fn ensure_signed_out<B, S>(
    profile_name: &str,
    session: &SessionContext<B, S>,
    requested: Route,
) -> Result<(), CliError>
where
    B: Backend + ?Sized,
    S: SessionPersistence,
{
    if session.route(requested) != Route::Editor {
        return Ok(());
    }
    let email = session
        .state()
        .account()
        .map(|account| account.email.clone())
        .unwrap_or_default();
    Err(CliError::AlreadySignedIn {
        profile: profile_name.to_string(),
        email,
    })
}

/// A resolved profile with its backend client and bootstrapped session.
pub struct AppContext {
    pub profile_name: String,
    pub config: BackendConfig,
    pub session: SessionContext<AppwriteBackend, SessionStore>,
}

impl AppContext {
    pub async fn load(global_profile: Option<&str>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = profiles.resolve_profile_name(global_profile);
        let config = profiles
            .backend_config(&profile_name)
            .map_err(CliError::Config)?;
        let backend = AppwriteBackend::new(&config)?;
        let session = SessionContext::new(Arc::new(backend), SessionStore::new(&profile_name));
        session.bootstrap().await;

        Ok(Self {
            profile_name,
            config,
            session,
        })
    }

    /// Load and require a signed-in session, as the editor route does.
    pub async fn signed_in(global_profile: Option<&str>) -> Result<Self, CliError> {
        let context = Self::load(global_profile).await?;
        if context.session.route(Route::Editor) == Route::Editor {
            Ok(context)
        } else {
            Err(CliError::NotSignedIn(context.profile_name))
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn notes(&self) -> NoteService<AppwriteBackend> {
        NoteService::new(self.session.backend(), self.config.notes_collection())
    }

    /// Editor controller with the on-disk draft mirror attached.
    pub fn editor(&self, mode: SaveMode) -> Result<EditorController<AppwriteBackend>, CliError> {
        let data_dir = default_data_dir().map_err(CliError::Config)?;
        let drafts = FileDraftStore::in_dir(&data_dir.join(&self.profile_name));
        Ok(EditorController::new(self.notes())
            .with_save_mode(mode)
            .with_draft_store(Arc::new(drafts)))
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub folder_id: i64,
    pub preview: String,
    pub content: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct FolderListItem {
    pub id: i64,
    pub name: String,
    pub notes: Vec<NoteListItem>,
}

pub async fn list_notes<B: Backend + ?Sized>(
    notes: &NoteService<B>,
) -> Result<Vec<Note>, CliError> {
    Ok(notes.list().await?)
}

/// Every note currently grouped in the editor state.
pub fn loaded_notes(state: &EditorState) -> Vec<Note> {
    state
        .folders()
        .iter()
        .flat_map(|folder| folder.notes.iter().cloned())
        .collect()
}

/// Find a note by exact id or unique id prefix.
pub fn resolve_note<'a>(note_query: &str, notes: &'a [Note]) -> Result<&'a Note, CliError> {
    if let Some(note) = notes.iter().find(|note| note.id.as_str() == note_query) {
        return Ok(note);
    }

    let matching = notes
        .iter()
        .filter(|note| note.id.starts_with(note_query))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::NoteNotFound(note_query.to_string())),
        [note] => Ok(*note),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|note| short_id(note.id.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_folder_lines(folders: &[Folder]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    let mut lines = Vec::new();
    for folder in folders {
        lines.push(format!("{} ({})", folder.name, folder.notes.len()));
        for note in &folder.notes {
            let short_id = short_id(note.id.as_str());
            let title = truncate_chars(&note.title, 24);
            let preview = note_preview(note, 40);
            let relative_time = note_relative_time(note, now_ms);
            lines.push(format!(
                "  {short_id:<13}  {title:<24}  {preview:<40}  {relative_time}"
            ));
        }
    }
    lines
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        folder_id: note.folder_id.get(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        created_at: note.created_at.clone(),
        updated_at: note.updated_at.clone(),
        relative_time: note_relative_time(note, now_ms),
    }
}

pub fn folder_to_list_item(folder: &Folder) -> FolderListItem {
    FolderListItem {
        id: folder.id.get(),
        name: folder.name.clone(),
        notes: folder.notes.iter().map(note_to_list_item).collect(),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn note_relative_time(note: &Note, now_ms: i64) -> String {
    note.updated_at
        .as_deref()
        .and_then(parse_timestamp_ms)
        .map_or_else(|| "-".to_string(), |updated| format_relative_time(updated, now_ms))
}

/// Backend stamps are RFC 3339 strings.
pub fn parse_timestamp_ms(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|time| time.timestamp_millis())
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Content from arguments, then piped stdin. Empty content is allowed.
pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }
    Ok(read_piped_stdin()?.unwrap_or_default())
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Open the preferred editor on `initial_content` and return the saved text
/// exactly as written, empty or not.
pub fn capture_editor_input_with_initial(initial_content: &str) -> Result<String, CliError> {
    capture_with_editor(&preferred_editor(), initial_content)
}

pub fn capture_with_editor(editor: &str, initial_content: &str) -> Result<String, CliError> {
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    if let Err(error) = std::fs::remove_file(&temp_file) {
        tracing::debug!("Failed to remove {}: {}", temp_file.display(), error);
    }
    launch_result?;

    Ok(note_content)
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };
            let mut command = Command::new(program);
            command.args(parts).arg(file_path);
            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("focusnotes-{}-{now}.md", std::process::id()))
}
