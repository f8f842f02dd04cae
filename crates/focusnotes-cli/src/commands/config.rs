use focusnotes_core::config::{non_blank, BackendConfig, BackendOverrides};
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ResolvedProfile<'a> {
    profile: &'a str,
    active: bool,
    backend: &'a BackendConfig,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            endpoint,
            project_id,
            platform,
            database_id,
            collection_id,
            no_activate,
        } => {
            let explicit = BackendOverrides {
                endpoint,
                project_id,
                platform,
                database_id,
                collection_id,
            };
            run_config_init(profile.as_deref().or(global_profile), explicit, no_activate)
        }
        ConfigCommands::Show { profile } => run_config_show(profile.as_deref().or(global_profile)),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    explicit: BackendOverrides,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config
        .profile(&profile_name)
        .map(CliProfile::overrides)
        .unwrap_or_default();

    let merged = merge_profile_overrides(explicit, BackendOverrides::from_env(), existing);
    let resolved = BackendConfig::default()
        .with_overrides(merged.clone())
        .map_err(CliError::Config)?;

    config.profile_mut_or_default(&profile_name).merge(merged);
    if !no_activate || config.active_profile.is_none() {
        config.active_profile = Some(profile_name.clone());
    }
    let path = config.save().map_err(CliError::Config)?;

    println!("Saved profile '{profile_name}' to {}", path.display());
    println!("Backend endpoint: {}", resolved.endpoint);
    if let Some(active) = config.active_profile.as_deref() {
        println!("Active profile: {active}");
    }
    Ok(())
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let backend = config
        .backend_config(&profile_name)
        .map_err(CliError::Config)?;

    let resolved = ResolvedProfile {
        profile: &profile_name,
        active: config.active_profile.as_deref() == Some(profile_name.as_str()),
        backend: &backend,
    };
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

/// Explicit flags win over environment variables, which win over what the
/// profile already stores.
pub fn merge_profile_overrides(
    explicit: BackendOverrides,
    env: BackendOverrides,
    existing: BackendOverrides,
) -> BackendOverrides {
    let explicit = BackendOverrides {
        endpoint: non_blank(explicit.endpoint),
        project_id: non_blank(explicit.project_id),
        platform: non_blank(explicit.platform),
        database_id: non_blank(explicit.database_id),
        collection_id: non_blank(explicit.collection_id),
    };
    explicit.or(env).or(existing)
}
