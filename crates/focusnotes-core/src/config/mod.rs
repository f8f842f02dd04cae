//! Backend connection configuration.
//!
//! Provides `BackendConfig`, the set of public identifiers every client needs
//! to reach the hosted backend: endpoint, project, platform, and the fixed
//! database/collection pair that holds notes. Secret credentials never live
//! here.

use serde::{Deserialize, Serialize};


pub const DEFAULT_ENDPOINT: &str = "https://fra.cloud.appwrite.io/v1";
pub const DEFAULT_PROJECT_ID: &str = "67ff3fc5000297797a96";
pub const DEFAULT_PLATFORM: &str = "com.example.focusnotes";
pub const DEFAULT_DATABASE_ID: &str = "67ff3fd9002be7657bca";
pub const DEFAULT_COLLECTION_ID: &str = "67ff3fe2001050775257";

/// Database/collection pair addressing a document collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub database_id: String,
    pub collection_id: String,
}

impl CollectionRef {
    pub fn new(database_id: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            collection_id: collection_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    pub endpoint: String,
    pub project_id: String,
    #[serde(default)]
    pub platform: Option<String>,
    pub database_id: String,
    pub collection_id: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            platform: Some(DEFAULT_PLATFORM.to_string()),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            collection_id: DEFAULT_COLLECTION_ID.to_string(),
        }
    }
}

/// Optional per-field overrides, layered over a base config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendOverrides {
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

impl BackendOverrides {
    /// Read overrides from `APPWRITE_*` / `FOCUSNOTES_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            endpoint: non_blank(lookup("APPWRITE_ENDPOINT")),
            project_id: non_blank(lookup("APPWRITE_PROJECT_ID")),
            platform: non_blank(lookup("APPWRITE_PLATFORM")),
            database_id: non_blank(lookup("FOCUSNOTES_DATABASE_ID")),
            collection_id: non_blank(lookup("FOCUSNOTES_COLLECTION_ID")),
        }
    }

    /// Fill unset fields from `fallback`. Fields already set here win.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            endpoint: self.endpoint.or(fallback.endpoint),
            project_id: self.project_id.or(fallback.project_id),
            platform: self.platform.or(fallback.platform),
            database_id: self.database_id.or(fallback.database_id),
            collection_id: self.collection_id.or(fallback.collection_id),
        }
    }
}

impl BackendConfig {
    /// Layer overrides over this config and validate the result.
    pub fn with_overrides(self, overrides: BackendOverrides) -> Result<Self, String> {
        let config = Self {
            endpoint: non_blank(overrides.endpoint).unwrap_or(self.endpoint),
            project_id: non_blank(overrides.project_id).unwrap_or(self.project_id),
            platform: non_blank(overrides.platform).or(self.platform),
            database_id: non_blank(overrides.database_id).unwrap_or(self.database_id),
            collection_id: non_blank(overrides.collection_id)
                .unwrap_or(self.collection_id),
        };
        config.validated()
    }

    /// Built-in defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, String> {
        Self::default().with_overrides(BackendOverrides::from_env())
    }

    /// The collection holding notes.
    #[must_use]
    pub fn notes_collection(&self) -> CollectionRef {
        CollectionRef::new(&self.database_id, &self.collection_id)
    }

    fn validated(mut self) -> Result<Self, String> {
        self.endpoint = normalize_endpoint(&self.endpoint)?;
        for (field, value) in [
            ("project_id", &self.project_id),
            ("database_id", &self.database_id),
            ("collection_id", &self.collection_id),
        ] {
            if value.trim().is_empty() {
                return Err(format!("backend field '{field}' is required"));
            }
        }
        Ok(self)
    }
}

/// Trimmed text, or `None` when nothing is left.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Trim the endpoint, require an http(s) scheme, and make sure it ends in `/v1`.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, String> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("backend endpoint must not be empty".to_string());
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err("backend endpoint must include http:// or https://".to_string());
    }
    if trimmed.ends_with("/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/v1"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn normalize_endpoint_appends_version_path() {
        assert_eq!(
            normalize_endpoint("https://cloud.example.com/").unwrap(),
            "https://cloud.example.com/v1"
        );
        assert_eq!(
            normalize_endpoint("https://cloud.example.com/v1").unwrap(),
            "https://cloud.example.com/v1"
        );
    }

    #[test]
    fn normalize_endpoint_rejects_missing_scheme() {
        assert!(normalize_endpoint("cloud.example.com").is_err());
        assert!(normalize_endpoint("ftp://cloud.example.com").is_err());
        assert!(normalize_endpoint("  ").is_err());
    }

    #[test]
    fn env_overrides_replace_defaults() {
        let env = HashMap::from([
            ("APPWRITE_ENDPOINT", "http://localhost:8080"),
            ("FOCUSNOTES_COLLECTION_ID", "notes"),
            ("APPWRITE_PROJECT_ID", "   "),
        ]);
        let overrides =
            BackendOverrides::from_lookup(|key| env.get(key).map(|value| (*value).to_string()));
        let config = BackendConfig::default().with_overrides(overrides).unwrap();

        assert_eq!(config.endpoint, "http://localhost:8080/v1");
        assert_eq!(config.collection_id, "notes");
        assert_eq!(config.project_id, DEFAULT_PROJECT_ID);
        assert_eq!(config.database_id, DEFAULT_DATABASE_ID);
    }

    #[test]
    fn overrides_or_prefers_self() {
        let explicit = BackendOverrides {
            project_id: Some("explicit".to_string()),
            ..Default::default()
        };
        let fallback = BackendOverrides {
            project_id: Some("fallback".to_string()),
            database_id: Some("db".to_string()),
            ..Default::default()
        };
        let merged = explicit.or(fallback);
        assert_eq!(merged.project_id.as_deref(), Some("explicit"));
        assert_eq!(merged.database_id.as_deref(), Some("db"));
    }

    #[test]
    fn notes_collection_uses_configured_pair() {
        let config = BackendConfig::default();
        assert_eq!(
            config.notes_collection(),
            CollectionRef::new(DEFAULT_DATABASE_ID, DEFAULT_COLLECTION_ID)
        );
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let payload = r#"{
            "endpoint": "https://cloud.example.com/v1",
            "project_id": "p",
            "database_id": "d",
            "collection_id": "c",
            "unexpected": true
        }"#;
        let error = serde_json::from_str::<BackendConfig>(payload).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }
}
