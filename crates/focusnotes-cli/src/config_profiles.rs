//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use focusnotes_core::config::{non_blank, BackendConfig, BackendOverrides};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
const APP_DIR_NAME: &str = "focusnotes";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

/// Per-profile backend overrides. Unset fields fall back to the built-in
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default)]
    pub collection_id: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

/// Directory for local state such as the draft mirror.
pub fn default_data_dir() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| "Failed to resolve CLI data directory".to_string())
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        self.resolve_profile_name_with_env(
            explicit,
            std::env::var("FOCUSNOTES_PROFILE").ok().as_deref(),
        )
    }

    fn resolve_profile_name_with_env(&self, explicit: Option<&str>, env: Option<&str>) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(env))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    /// Backend config for a profile: environment first, then the profile,
    /// then built-in defaults.
    pub fn backend_config(&self, profile_name: &str) -> Result<BackendConfig, String> {
        let profile = self
            .profile(profile_name)
            .map(CliProfile::overrides)
            .unwrap_or_default();
        BackendConfig::default().with_overrides(BackendOverrides::from_env().or(profile))
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    pub fn overrides(&self) -> BackendOverrides {
        BackendOverrides {
            endpoint: non_blank(self.endpoint.clone()),
            project_id: non_blank(self.project_id.clone()),
            platform: non_blank(self.platform.clone()),
            database_id: non_blank(self.database_id.clone()),
            collection_id: non_blank(self.collection_id.clone()),
        }
    }

    /// Replace fields that `overrides` sets; keep the rest.
    pub fn merge(&mut self, overrides: BackendOverrides) {
        let merged = overrides.or(self.overrides());
        self.endpoint = merged.endpoint;
        self.project_id = merged.project_id;
        self.platform = merged.platform;
        self.database_id = merged.database_id;
        self.collection_id = merged.collection_id;
    }

    fn normalize(&mut self) {
        let normalized = self.overrides();
        self.merge(normalized);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_profile_name_rejects_empty() {
        assert_eq!(normalize_profile_name(None), None);
        assert_eq!(normalize_profile_name(Some(" ")), None);
        assert_eq!(normalize_profile_name(Some(" work ")), Some("work".to_string()));
    }

    #[test]
    fn profile_name_resolution_order() {
        let config = CliProfilesConfig {
            active_profile: Some("saved".to_string()),
            ..CliProfilesConfig::default()
        };
        assert_eq!(
            config.resolve_profile_name_with_env(Some("flag"), Some("env")),
            "flag"
        );
        assert_eq!(config.resolve_profile_name_with_env(None, Some("env")), "env");
        assert_eq!(config.resolve_profile_name_with_env(None, None), "saved");
        assert_eq!(
            CliProfilesConfig::default().resolve_profile_name_with_env(None, Some(" ")),
            "default"
        );
    }

    #[test]
    fn config_roundtrip_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = CliProfilesConfig {
            version: 1,
            active_profile: Some("default".to_string()),
            profiles: BTreeMap::new(),
        };
        config.profiles.insert(
            "default".to_string(),
            CliProfile {
                endpoint: Some(" https://appwrite.example.com/v1 ".to_string()),
                project_id: Some(" project ".to_string()),
                platform: Some("   ".to_string()),
                database_id: None,
                collection_id: None,
            },
        );

        config.save_to_path(&path).unwrap();
        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();
        let profile = loaded.profile("default").unwrap();

        assert_eq!(loaded.active_profile.as_deref(), Some("default"));
        assert_eq!(
            profile.endpoint.as_deref(),
            Some("https://appwrite.example.com/v1")
        );
        assert_eq!(profile.project_id.as_deref(), Some("project"));
        assert_eq!(profile.platform, None);
    }

    #[test]
    fn missing_config_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = CliProfilesConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, CliProfilesConfig::default());
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let mut profile = CliProfile {
            endpoint: Some("https://one.example.com/v1".to_string()),
            project_id: Some("p1".to_string()),
            ..CliProfile::default()
        };
        profile.merge(BackendOverrides {
            project_id: Some("p2".to_string()),
            ..BackendOverrides::default()
        });
        assert_eq!(profile.endpoint.as_deref(), Some("https://one.example.com/v1"));
        assert_eq!(profile.project_id.as_deref(), Some("p2"));
    }
}
