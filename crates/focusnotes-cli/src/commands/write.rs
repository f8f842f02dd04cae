use focusnotes_core::backend::Backend;
use focusnotes_core::editor::{EditorController, SaveMode, SaveStatus};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::commands::common::{
    loaded_notes, normalize_note_identifier, resolve_note, AppContext,
};
use crate::error::CliError;

pub async fn run_write(profile: Option<&str>, id: &str, mode: SaveMode) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let context = AppContext::signed_in(profile).await?;
    let editor = context.editor(mode)?;
    editor.refresh().await?;

    let notes = loaded_notes(&editor.snapshot().await);
    let note_id = resolve_note(&normalized_id, &notes)?.id.clone();
    editor.select_document(&note_id).await?;

    let lines = write_lines(&editor, BufReader::new(tokio::io::stdin())).await?;
    tracing::info!("Wrote {} lines to note {}", lines, note_id);
    println!("{note_id}");
    Ok(())
}

/// Append each input line to the selected note's draft as a separate edit,
/// then flush whatever is still unsaved. Returns the number of lines read.
pub async fn write_lines<B, R>(editor: &EditorController<B>, reader: R) -> Result<usize, CliError>
where
    B: Backend + ?Sized + 'static,
    R: AsyncBufRead + Unpin,
{
    let mut draft = editor.snapshot().await.draft().to_string();
    let mut lines = reader.lines();
    let mut count = 0;

    while let Some(line) = lines.next_line().await? {
        if !draft.is_empty() {
            draft.push('\n');
        }
        draft.push_str(&line);
        editor.edit(draft.clone()).await?;
        count += 1;
    }

    editor.save_now().await?;
    if let SaveStatus::Failed(message) = editor.snapshot().await.status() {
        return Err(CliError::SaveFailed(message.clone()));
    }
    Ok(count)
}
