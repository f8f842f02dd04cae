use focusnotes_core::models::group_by_folder;
use focusnotes_core::FolderId;

use crate::commands::common::{
    folder_to_list_item, format_folder_lines, list_notes, AppContext, FolderListItem,
};
use crate::error::CliError;

pub async fn run_list(
    profile: Option<&str>,
    folder: Option<FolderId>,
    as_json: bool,
) -> Result<(), CliError> {
    let context = AppContext::signed_in(profile).await?;
    let notes = list_notes(&context.notes()).await?;

    let folders = group_by_folder(&notes)
        .into_iter()
        .filter(|candidate| folder.is_none_or(|id| candidate.id == id))
        .collect::<Vec<_>>();

    if as_json {
        let json_items = folders
            .iter()
            .map(folder_to_list_item)
            .collect::<Vec<FolderListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if folders.is_empty() {
        println!("No notes yet. Create one with `focusnotes add --folder 1 --title ...`");
    } else {
        for line in format_folder_lines(&folders) {
            println!("{line}");
        }
    }

    Ok(())
}
