use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use focusnotes_core::backend::{Backend, MemoryBackend};
use focusnotes_core::config::{BackendOverrides, CollectionRef};
use focusnotes_core::editor::{EditorController, SaveMode, SaveStatus};
use focusnotes_core::notes::NoteService;
use focusnotes_core::session::{MemorySessionStore, Route, SessionContext};
use focusnotes_core::{FolderId, Note, NoteId};
use pretty_assertions::assert_eq;

use crate::cli::{Cli, Commands, CompletionShell, SaveModeArg};
use crate::commands::common::{
    capture_with_editor, default_editor, ensure_signed_out, format_folder_lines,
    format_relative_time, normalize_content, normalize_note_identifier, note_preview,
    parse_timestamp_ms, resolve_note,
};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::merge_profile_overrides;
use crate::commands::write::write_lines;
use crate::error::CliError;

fn note(id: &str, content: &str) -> Note {
    Note {
        id: NoteId::new(id),
        title: format!("Title {id}"),
        content: content.to_string(),
        folder_id: FolderId::new(1),
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn normalize_note_identifier_rejects_blank() {
    assert!(matches!(
        normalize_note_identifier("   "),
        Err(CliError::EmptyNoteId)
    ));
    assert_eq!(normalize_note_identifier(" abc ").unwrap(), "abc");
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn parses_backend_timestamps() {
    assert_eq!(
        parse_timestamp_ms("1970-01-01T00:00:01.500+00:00"),
        Some(1_500)
    );
    assert_eq!(parse_timestamp_ms("yesterday"), None);
}

#[test]
fn note_preview_uses_first_line_and_truncates() {
    let preview = note_preview(&note("a", "  first   line  \nsecond"), 40);
    assert_eq!(preview, "first line");

    let long = note_preview(&note("a", &"x".repeat(50)), 10);
    assert_eq!(long, "xxxxxxx...");
}

#[test]
fn resolve_note_prefers_exact_id() {
    let notes = vec![note("abc", ""), note("abcdef", "")];
    assert_eq!(resolve_note("abc", &notes).unwrap().id.as_str(), "abc");
    assert_eq!(resolve_note("abcd", &notes).unwrap().id.as_str(), "abcdef");
}

#[test]
fn resolve_note_reports_missing_and_ambiguous_prefixes() {
    let notes = vec![note("abc1", ""), note("abc2", "")];
    assert!(matches!(
        resolve_note("zzz", &notes),
        Err(CliError::NoteNotFound(_))
    ));
    match resolve_note("abc", &notes) {
        Err(CliError::AmbiguousNoteId(message)) => {
            assert!(message.contains("abc1"));
            assert!(message.contains("abc2"));
        }
        other => panic!("expected ambiguity error, got {other:?}"),
    }
}

#[test]
fn folder_lines_list_notes_under_heading() {
    let folders = focusnotes_core::models::group_by_folder(&[note("n1", "hello")]);
    let lines = format_folder_lines(&folders);
    assert_eq!(lines[0], "Folder 1 (1)");
    assert!(lines[1].contains("n1"));
    assert!(lines[1].contains("hello"));
}

#[test]
fn explicit_config_flags_win_over_env_and_existing() {
    let explicit = BackendOverrides {
        endpoint: Some(" https://flag.example.com/v1 ".to_string()),
        project_id: Some("  ".to_string()),
        ..BackendOverrides::default()
    };
    let env = BackendOverrides {
        project_id: Some("env-project".to_string()),
        ..BackendOverrides::default()
    };
    let existing = BackendOverrides {
        endpoint: Some("https://old.example.com/v1".to_string()),
        database_id: Some("old-db".to_string()),
        ..BackendOverrides::default()
    };

    let merged = merge_profile_overrides(explicit, env, existing);
    assert_eq!(merged.endpoint.as_deref(), Some("https://flag.example.com/v1"));
    assert_eq!(merged.project_id.as_deref(), Some("env-project"));
    assert_eq!(merged.database_id.as_deref(), Some("old-db"));
    assert_eq!(merged.collection_id, None);
}

#[test]
fn cli_parses_write_options() {
    let cli = Cli::try_parse_from([
        "focusnotes",
        "--profile",
        "work",
        "write",
        "abc",
        "--save-mode",
        "immediate",
    ])
    .unwrap();
    assert_eq!(cli.profile.as_deref(), Some("work"));
    match cli.command {
        Commands::Write {
            id,
            save_mode,
            debounce_ms,
        } => {
            assert_eq!(id, "abc");
            assert_eq!(save_mode, SaveModeArg::Immediate);
            assert_eq!(save_mode.into_save_mode(debounce_ms), SaveMode::Immediate);
        }
        _ => panic!("expected write command"),
    }
}

#[test]
fn cli_parses_folder_ids() {
    let cli = Cli::try_parse_from(["focusnotes", "add", "--folder", "3", "--title", "T"]).unwrap();
    match cli.command {
        Commands::Add {
            folder,
            title,
            content,
        } => {
            assert_eq!(folder, FolderId::new(3));
            assert_eq!(title, "T");
            assert!(content.is_empty());
        }
        _ => panic!("expected add command"),
    }

    assert!(Cli::try_parse_from(["focusnotes", "list", "--folder", "three"]).is_err());
}

#[test]
fn debounced_is_the_default_save_mode() {
    assert_eq!(
        SaveModeArg::Debounced.into_save_mode(2000),
        SaveMode::Debounced(Duration::from_secs(2))
    );
}

#[test]
fn completions_mention_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("focusnotes"));
}

#[test]
fn completions_write_to_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusnotes.fish");
    run_completions(CompletionShell::Fish, Some(&path)).unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("focusnotes"));
}

async fn signed_in_editor(mode: SaveMode) -> (Arc<MemoryBackend>, EditorController<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_account("Ada", "ada@example.com", "correct-horse");
    backend
        .create_email_session("ada@example.com", "correct-horse")
        .await
        .unwrap();
    let notes = NoteService::new(Arc::clone(&backend), CollectionRef::new("db", "notes"));
    notes.create("Journal", "", FolderId::new(1)).await.unwrap();
    let editor = EditorController::new(notes).with_save_mode(mode);
    editor.refresh().await.unwrap();
    (backend, editor)
}

#[tokio::test(start_paused = true)]
async fn write_lines_debounces_and_flushes_at_end() {
    let (backend, editor) = signed_in_editor(SaveMode::default()).await;

    let input: &[u8] = b"first\nsecond\nthird\n";
    let count = write_lines(&editor, input).await.unwrap();
    assert_eq!(count, 3);

    let updates = backend.recorded_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].1.get("FileContent"),
        Some(&serde_json::json!("first\nsecond\nthird"))
    );
    assert_eq!(editor.snapshot().await.status(), &SaveStatus::Clean);
}

#[tokio::test]
async fn write_lines_reports_failed_save() {
    let (backend, editor) = signed_in_editor(SaveMode::Manual).await;
    backend.set_offline(true);

    let input: &[u8] = b"lost\n";
    let result = write_lines(&editor, input).await;
    assert!(result.is_err());
    assert!(matches!(
        editor.snapshot().await.status(),
        SaveStatus::Failed(_)
    ));
}

#[tokio::test]
async fn login_and_register_are_refused_once_signed_in() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_account("Ada", "ada@example.com", "correct-horse");
    let session = SessionContext::new(Arc::clone(&backend), MemorySessionStore::new());
    session.bootstrap().await;

    assert!(ensure_signed_out("work", &session, Route::SignIn).is_ok());
    assert!(ensure_signed_out("work", &session, Route::Register).is_ok());

    session.signin("ada@example.com", "correct-horse").await.unwrap();
    for requested in [Route::SignIn, Route::Register] {
        let error = ensure_signed_out("work", &session, requested).unwrap_err();
        assert!(matches!(
            &error,
            CliError::AlreadySignedIn { profile, email }
                if profile == "work" && email == "ada@example.com"
        ));
        assert!(error.to_string().contains("already signed in as ada@example.com"));
    }
}

#[cfg(unix)]
#[test]
fn edited_text_is_kept_verbatim() {
    assert_eq!(capture_with_editor("true", "body\n\n").unwrap(), "body\n\n");
    assert_eq!(capture_with_editor("true", "").unwrap(), "");
}
