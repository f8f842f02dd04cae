use focusnotes_core::editor::validate_document_name;
use focusnotes_core::FolderId;

use crate::commands::common::{resolve_note_content, AppContext};
use crate::error::CliError;

pub async fn run_add(
    profile: Option<&str>,
    folder: FolderId,
    title: &str,
    content_parts: &[String],
) -> Result<(), CliError> {
    let title = validate_document_name(title)?;
    let content = resolve_note_content(content_parts)?;

    let context = AppContext::signed_in(profile).await?;
    let note = context.notes().create(title, &content, folder).await?;

    println!("{}", note.id);
    Ok(())
}
