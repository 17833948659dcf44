//! Local device key storage.
//!
//! Each project a user works on gets its own device keypair. The private
//! half never leaves the local machine; only the public half is committed.
//!
//! ## Adding a New Storage Backend
//!
//! 1. Implement the `Store` trait
//! 2. Add the implementation in a new file
//! 3. Re-export from this module
//!
//! Rotation and re-creation stage the new key first so the engine can
//! swap the committed artifacts before the new private key replaces the old.

use std::path::PathBuf;

use crate::core::domain::Identity;
use crate::core::types::DeviceId;
use crate::error::Result;

mod fs;

pub use fs::Filesystem;
pub(crate) use fs::validate_file_permissions;

/// Key storage trait.
pub trait Store {
    /// Persist a device identity for a project.
    ///
    /// The new key is durably written before any previous key disappears;
    /// a previous key is archived.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the key cannot be written.
    fn save(&self, project_id: &str, identity: &Identity) -> Result<()>;

    /// Load the device identity for a project.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoPrivateKey` if none exists, or
    /// `StoreError::InvalidFormat` if the key is malformed.
    fn load(&self, project_id: &str) -> Result<Identity>;

    /// Check if a key exists for a project.
    fn has_key(&self, project_id: &str) -> bool;

    /// Device id recorded for a project, if any.
    fn device_id(&self, project_id: &str) -> Result<Option<DeviceId>>;

    /// Write a replacement key beside the current one without activating it.
    fn stage(&self, project_id: &str, identity: &Identity) -> Result<()>;

    /// Activate the staged key, archiving the current one.
    ///
    /// Returns the archive path of the superseded key.
    fn promote(&self, project_id: &str) -> Result<Option<PathBuf>>;

    /// Delete a staged key.
    fn discard(&self, project_id: &str) -> Result<()>;

    /// Location of the active private key.
    fn key_path(&self, project_id: &str) -> PathBuf;
}
