//! Membership registry.
//!
//! Handles reading, writing, and validating `.cellar/project.toml`: project
//! metadata, the devices granted access and the secret files being tracked.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config;
use crate::core::types::{DeviceId, Email, ProjectId};
use crate::error::{ConfigError, Result};

/// Registry format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Project registry stored in `.cellar/project.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    /// Metadata about the project
    pub project: ProjectMeta,
    /// Registered devices keyed by device id
    #[serde(default)]
    pub devices: BTreeMap<DeviceId, Member>,
    /// Tracked plaintext paths, relative to the project root
    #[serde(default)]
    pub files: BTreeSet<String>,
}

/// Metadata section of the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub id: ProjectId,
    pub name: String,
    pub version: u32,
}

/// A device entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub email: Email,
    /// Device display name
    pub name: String,
    pub added: DateTime<Utc>,
}

impl Registry {
    /// Create an empty registry for a new project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: ProjectMeta {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.into(),
                version: FORMAT_VERSION,
            },
            devices: BTreeMap::new(),
            files: BTreeSet::new(),
        }
    }

    /// Load and validate the registry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotInitialized` if the file doesn't exist,
    /// or `ConfigError::Invalid` if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading registry");
        let registry: Self = config::read_toml(path)?;
        debug!(
            devices = registry.devices.len(),
            files = registry.files.len(),
            "registry loaded"
        );
        registry.validate()?;
        Ok(registry)
    }

    /// Serialize for staging in a changeset.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self).map_err(ConfigError::Serialize)?)
    }

    /// Validate the registry structure and contents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` or `ConfigError::InvalidValue`.
    pub fn validate(&self) -> Result<()> {
        if self.project.id.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "project.id" }.into());
        }
        if self.project.version == 0 || self.project.version > FORMAT_VERSION {
            return Err(ConfigError::InvalidValue {
                field: "project.version",
                reason: format!(
                    "unsupported format version {} (this build reads up to {})",
                    self.project.version, FORMAT_VERSION
                ),
            }
            .into());
        }
        for id in self.devices.keys() {
            validate_device_id(id)?;
        }
        for file in &self.files {
            if file.is_empty() || file.starts_with('/') || file.split('/').any(|p| p == "..") {
                return Err(ConfigError::InvalidValue {
                    field: "files",
                    reason: format!("'{file}' is not a path inside the project"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Devices registered for a user email.
    pub fn devices_of(&self, email: &str) -> Vec<DeviceId> {
        self.devices
            .iter()
            .filter(|(_, m)| m.email.eq_ignore_ascii_case(email))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Device ids name files, so they must be plain path segments.
pub fn validate_device_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "devices",
            reason: format!("'{id}' is not a valid device id"),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn member(email: &str) -> Member {
        Member {
            user_id: "u1".to_string(),
            email: email.to_string(),
            name: "laptop".to_string(),
            added: Utc::now(),
        }
    }

    #[test]
    fn test_roundtrip_through_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("project.toml");

        let mut registry = Registry::new("demo");
        registry.devices.insert("dev-1".to_string(), member("a@x.io"));
        registry.files.insert("config/prod.env".to_string());
        std::fs::write(&path, registry.to_toml().unwrap()).unwrap();

        let loaded = Registry::load(&path).unwrap();
        assert_eq!(loaded.project.id, registry.project.id);
        assert_eq!(loaded.devices["dev-1"], registry.devices["dev-1"]);
        assert!(loaded.files.contains("config/prod.env"));
    }

    #[test]
    fn test_rejects_future_version_and_bad_ids() {
        let mut registry = Registry::new("demo");
        registry.project.version = FORMAT_VERSION + 1;
        assert_eq!(registry.validate().unwrap_err().kind(), ErrorKind::ConfigInvalid);

        let mut registry = Registry::new("demo");
        registry.devices.insert("../evil".to_string(), member("a@x.io"));
        assert!(registry.validate().is_err());

        let mut registry = Registry::new("demo");
        registry.files.insert("../outside".to_string());
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_malformed_registry_reports_location() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("project.toml");
        std::fs::write(&path, "[project]\nid = \"x\"\nversion = oops\n").unwrap();

        let err = Registry::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.to_string().contains("project.toml:3:"));
    }

    #[test]
    fn test_devices_of_is_case_insensitive() {
        let mut registry = Registry::new("demo");
        registry.devices.insert("d1".to_string(), member("Alice@x.io"));
        registry.devices.insert("d2".to_string(), member("bob@x.io"));
        assert_eq!(registry.devices_of("alice@x.io"), vec!["d1".to_string()]);
    }
}
