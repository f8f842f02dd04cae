use crate::commands::common::{
    list_notes, normalize_note_identifier, note_to_list_item, resolve_note, AppContext,
};
use crate::error::CliError;

pub async fn run_show(profile: Option<&str>, id: &str, as_json: bool) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let context = AppContext::signed_in(profile).await?;
    let notes = list_notes(&context.notes()).await?;
    let note = resolve_note(&normalized_id, &notes)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note_to_list_item(note))?);
        return Ok(());
    }

    println!("{}  [Folder {}]  {}", note.title, note.folder_id, note.id);
    if let Some(updated_at) = note.updated_at.as_deref() {
        println!("updated {updated_at}");
    }
    println!();
    println!("{}", note.content);
    Ok(())
}
