use focusnotes_core::editor::{SaveMode, SaveStatus};

use crate::commands::common::{
    capture_editor_input_with_initial, loaded_notes, normalize_note_identifier, resolve_note,
    AppContext,
};
use crate::error::CliError;

pub async fn run_edit(profile: Option<&str>, id: &str) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let context = AppContext::signed_in(profile).await?;
    let editor = context.editor(SaveMode::Manual)?;
    editor.refresh().await?;

    let notes = loaded_notes(&editor.snapshot().await);
    let note_id = resolve_note(&normalized_id, &notes)?.id.clone();
    editor.select_document(&note_id).await?;

    // The draft may hold mirrored text from an earlier interrupted edit.
    let snapshot = editor.snapshot().await;
    let edited_content = capture_editor_input_with_initial(snapshot.draft())?;

    let unchanged = snapshot
        .current_note()
        .is_some_and(|note| note.content == edited_content);
    if unchanged && snapshot.status() == &SaveStatus::Clean {
        println!("{note_id}");
        return Ok(());
    }

    editor.edit(edited_content).await?;
    let saved = editor.save_now().await?;
    println!("{}", saved.map_or(note_id, |note| note.id));
    Ok(())
}
