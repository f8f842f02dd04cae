use focusnotes_core::session::{Route, SessionState};

use crate::cli::AuthCommands;
use crate::commands::common::{ensure_signed_out, AppContext};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let context = AppContext::load(global_profile).await?;
    let profile_name = context.profile_name.as_str();

    match command {
        AuthCommands::Register {
            name,
            email,
            password,
        } => {
            ensure_signed_out(profile_name, &context.session, Route::Register)?;
            let account = context.session.signup(&name, &email, &password).await?;
            println!(
                "Registered and signed in profile '{profile_name}' as {}",
                account.email
            );
        }
        AuthCommands::Login { email, password } => {
            ensure_signed_out(profile_name, &context.session, Route::SignIn)?;
            let account = context.session.signin(&email, &password).await?;
            println!("Signed in profile '{profile_name}' as {}", account.email);
        }
        AuthCommands::Status => match context.state() {
            SessionState::Authenticated { account, session } => {
                let expires = session
                    .and_then(|session| session.expire)
                    .map_or_else(String::new, |expire| format!(" (expires {expire})"));
                println!(
                    "Profile '{profile_name}' is signed in as {} <{}>{expires}",
                    account.name, account.email
                );
            }
            SessionState::Unauthenticated | SessionState::Loading => {
                println!("Profile '{profile_name}' is not signed in.");
            }
        },
        AuthCommands::Logout => match context.session.signout().await {
            Ok(()) => println!("Signed out profile '{profile_name}'"),
            Err(error) => {
                tracing::warn!("Remote sign-out failed: {}", error);
                println!(
                    "Signed out profile '{profile_name}' locally; the remote session could not be deleted"
                );
            }
        },
    }

    Ok(())
}
