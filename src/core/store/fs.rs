//! Filesystem-based key storage implementation.
//!
//! Layout below the cellar home (`~/.cellar`):
//!
//! ```text
//! keys/<project-id>/
//! ├── identity.key          # 0600
//! ├── identity.key.staged   # only during rotation
//! ├── device.toml
//! └── archive/identity.key.<timestamp>
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Store;
use crate::core::domain::Identity;
use crate::core::types::DeviceId;
use crate::core::{atomic, config, constants};
use crate::error::{ConfigError, Result, StoreError, ValidationError};

const STAGED_SUFFIX: &str = ".staged";

/// Local record of which device this machine is for a project.
#[derive(Debug, Serialize, Deserialize)]
struct DeviceRecord {
    id: DeviceId,
    created: DateTime<Utc>,
}

/// Validate file permissions (Unix only).
#[cfg(unix)]
pub(crate) fn validate_file_permissions(path: &Path, expected_mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)?;
    let actual_mode = metadata.permissions().mode() & 0o777;

    if actual_mode != expected_mode {
        return Err(ValidationError::InvalidPermissions {
            path: path.display().to_string(),
            expected: format!("{:o}", expected_mode),
            actual: format!("{:o}", actual_mode),
        }
        .into());
    }

    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn validate_file_permissions(_path: &Path, _expected_mode: u32) -> Result<()> {
    Ok(())
}

/// Filesystem-based key storage.
#[derive(Debug, Clone)]
pub struct Filesystem {
    home: PathBuf,
}

impl Filesystem {
    /// Storage rooted at a cellar home directory.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Directory for a specific project's keys.
    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.home.join(constants::KEYS_DIR).join(project_id)
    }

    fn staged_path(&self, project_id: &str) -> PathBuf {
        let mut name = constants::IDENTITY_FILE.to_string();
        name.push_str(STAGED_SUFFIX);
        self.project_dir(project_id).join(name)
    }

    fn device_path(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join(constants::DEVICE_FILE)
    }

    fn write_key(path: &Path, identity: &Identity) -> Result<()> {
        let secret = identity.to_secret_string();
        atomic::write(path, secret.as_bytes(), Some(constants::PRIVATE_KEY_MODE))
            .map_err(StoreError::WriteFailed)?;
        Ok(())
    }

    fn write_device(&self, project_id: &str, device: &str) -> Result<()> {
        let record = DeviceRecord {
            id: device.to_string(),
            created: Utc::now(),
        };
        let contents = toml::to_string_pretty(&record).map_err(ConfigError::Serialize)?;
        atomic::write(&self.device_path(project_id), contents.as_bytes(), None)
            .map_err(StoreError::WriteFailed)?;
        Ok(())
    }

    /// Copy the active key into the archive.
    fn archive(&self, project_id: &str) -> Result<Option<PathBuf>> {
        let current = self.key_path(project_id);
        let bytes = match fs::read(&current) {
            Ok(b) => zeroize::Zeroizing::new(b),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::ReadFailed(e).into()),
        };

        let timestamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
        let archived = self
            .project_dir(project_id)
            .join(constants::ARCHIVE_DIR)
            .join(format!("{}.{}", constants::IDENTITY_FILE, timestamp));
        atomic::write(&archived, &bytes, Some(constants::PRIVATE_KEY_MODE))
            .map_err(StoreError::WriteFailed)?;
        debug!(path = %archived.display(), "archived previous key");
        Ok(Some(archived))
    }
}

impl Store for Filesystem {
    fn save(&self, project_id: &str, identity: &Identity) -> Result<()> {
        self.archive(project_id)?;
        Self::write_key(&self.key_path(project_id), identity)?;
        self.write_device(project_id, identity.device_id())?;
        debug!(project = project_id, device = identity.device_id(), "key saved");
        Ok(())
    }

    fn load(&self, project_id: &str) -> Result<Identity> {
        let key_path = self.key_path(project_id);
        debug!(path = %key_path.display(), "loading identity");

        if !key_path.exists() {
            return Err(StoreError::NoPrivateKey(project_id.to_string()).into());
        }

        if let Err(e) = validate_file_permissions(&key_path, constants::PRIVATE_KEY_MODE) {
            warn!(path = %key_path.display(), error = %e, "insecure key file permissions");
        }

        let device = self
            .device_id(project_id)?
            .ok_or_else(|| StoreError::InvalidFormat(self.device_path(project_id)))?;
        let contents = zeroize::Zeroizing::new(
            fs::read_to_string(&key_path).map_err(StoreError::ReadFailed)?,
        );
        Identity::parse(device, &contents, &key_path)
    }

    fn has_key(&self, project_id: &str) -> bool {
        self.key_path(project_id).is_file()
    }

    fn device_id(&self, project_id: &str) -> Result<Option<DeviceId>> {
        let path = self.device_path(project_id);
        if !path.exists() {
            return Ok(None);
        }
        let record: DeviceRecord = config::read_toml(&path)?;
        Ok(Some(record.id))
    }

    fn stage(&self, project_id: &str, identity: &Identity) -> Result<()> {
        Self::write_key(&self.staged_path(project_id), identity)
    }

    fn promote(&self, project_id: &str) -> Result<Option<PathBuf>> {
        let staged = self.staged_path(project_id);
        if !staged.is_file() {
            return Err(StoreError::NoPrivateKey(format!("{project_id} (staged)")).into());
        }
        let archived = self.archive(project_id)?;
        fs::rename(&staged, self.key_path(project_id)).map_err(StoreError::WriteFailed)?;
        debug!(project = project_id, "staged key promoted");
        Ok(archived)
    }

    fn discard(&self, project_id: &str) -> Result<()> {
        atomic::remove(&self.staged_path(project_id)).map_err(StoreError::WriteFailed)?;
        Ok(())
    }

    fn key_path(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join(constants::IDENTITY_FILE)
    }
}
