//! FocusNotes CLI - notes from the terminal, stored in the hosted backend
//!
//! Every note command requires a signed-in profile; run
//! `focusnotes auth login` first.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::write::run_write;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("focusnotes=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Auth { command } => run_auth(command, profile).await?,
        Commands::List { folder, json } => run_list(profile, folder, json).await?,
        Commands::Show { id, json } => run_show(profile, &id, json).await?,
        Commands::Add {
            folder,
            title,
            content,
        } => run_add(profile, folder, &title, &content).await?,
        Commands::Edit { id } => run_edit(profile, &id).await?,
        Commands::Write {
            id,
            save_mode,
            debounce_ms,
        } => run_write(profile, &id, save_mode.into_save_mode(debounce_ms)).await?,
        Commands::Delete { id } => run_delete(profile, &id).await?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
