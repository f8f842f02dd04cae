use crate::commands::common::{list_notes, normalize_note_identifier, resolve_note, AppContext};
use crate::error::CliError;

pub async fn run_delete(profile: Option<&str>, id: &str) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let context = AppContext::signed_in(profile).await?;
    let service = context.notes();
    let notes = list_notes(&service).await?;
    let note = resolve_note(&normalized_id, &notes)?;

    service.delete(&note.id).await?;
    println!("{}", note.id);
    Ok(())
}
