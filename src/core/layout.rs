//! Store layout.
//!
//! Thin persistence boundary over the artifacts a project commits:
//!
//! ```text
//! <root>/
//! ├── .cellar/
//! │   ├── project.toml          # registry
//! │   ├── public_keys/<device>  # age public keys
//! │   ├── secrets/<device>      # project key wrapped per device
//! │   └── audit.log
//! ├── config/prod.env           # plaintext (ignored by git)
//! └── config/prod.env.enc       # ciphertext sibling (committed)
//! ```
//!
//! No cryptography and no business rules live here. Mutations are staged
//! in a [`Changeset`] and applied together at the end of an operation.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::core::atomic;
use crate::core::cipher::WrappedKey;
use crate::core::constants;
use crate::core::domain::SecretFile;
use crate::core::registry::validate_device_id;
use crate::core::resolve::{self, FileKind};
use crate::core::types::{DeviceId, PublicKey};
use crate::error::{AccessError, Result, StoreError};

/// Paths and artifact accessors for one project.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Layout rooted at a project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `.cellar/`
    pub fn store_dir(&self) -> PathBuf {
        self.root.join(constants::STORE_DIR)
    }

    /// `.cellar/public_keys/`
    pub fn public_keys_dir(&self) -> PathBuf {
        self.store_dir().join(constants::PUBLIC_KEYS_DIR)
    }

    /// `.cellar/secrets/`
    pub fn wrapped_keys_dir(&self) -> PathBuf {
        self.store_dir().join(constants::WRAPPED_KEYS_DIR)
    }

    /// `.cellar/project.toml`
    pub fn registry_path(&self) -> PathBuf {
        self.store_dir().join(constants::REGISTRY_FILE)
    }

    /// `.cellar/audit.log`
    pub fn audit_log_path(&self) -> PathBuf {
        self.store_dir().join(constants::AUDIT_LOG)
    }

    /// `<root>/.gitignore`
    pub fn gitignore_path(&self) -> PathBuf {
        self.root.join(constants::GITIGNORE)
    }

    /// Public key artifact for a device.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `device` is not a plain
    /// device id (`../x`, `/etc/passwd`).
    pub fn public_key_path(&self, device: &str) -> Result<PathBuf> {
        validate_device_id(device)?;
        Ok(self.public_keys_dir().join(device))
    }

    /// Wrapped key artifact for a device.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `device` is not a plain
    /// device id.
    pub fn wrapped_key_path(&self, device: &str) -> Result<PathBuf> {
        validate_device_id(device)?;
        Ok(self.wrapped_keys_dir().join(device))
    }

    /// Whether the store has been initialized.
    pub fn exists(&self) -> bool {
        self.registry_path().is_file()
    }

    /// Device ids that have a public key.
    pub fn list_public_keys(&self) -> Result<BTreeSet<DeviceId>> {
        list_dir(&self.public_keys_dir())
    }

    /// Device ids that have a wrapped key.
    pub fn list_wrapped_keys(&self) -> Result<BTreeSet<DeviceId>> {
        list_dir(&self.wrapped_keys_dir())
    }

    pub fn has_public_key(&self, device: &str) -> bool {
        self.public_key_path(device).is_ok_and(|p| p.is_file())
    }

    pub fn has_wrapped_key(&self, device: &str) -> bool {
        self.wrapped_key_path(device).is_ok_and(|p| p.is_file())
    }

    /// Read a device's public key.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::DeviceNotFound` if the device has no public key.
    pub fn read_public_key(&self, device: &str) -> Result<PublicKey> {
        let path = self.public_key_path(device)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AccessError::DeviceNotFound(device.to_string()).into())
            }
            Err(e) => Err(StoreError::ReadFailed(e).into()),
        }
    }

    /// Read a device's wrapped key, if it has one.
    pub fn read_wrapped_key(&self, device: &str) -> Result<Option<WrappedKey>> {
        let path = self.wrapped_key_path(device)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(WrappedKey::from(text))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFailed(e).into()),
        }
    }

    /// Ciphertext sibling of a plaintext path.
    pub fn cipher_path(plain: &Path) -> PathBuf {
        let mut name = plain.as_os_str().to_os_string();
        name.push(constants::CIPHER_SUFFIX);
        PathBuf::from(name)
    }

    /// Plaintext sibling of a ciphertext path.
    pub fn plain_path(cipher: &Path) -> Option<PathBuf> {
        let text = cipher.to_str()?;
        text.strip_suffix(constants::CIPHER_SUFFIX)
            .filter(|s| !s.is_empty() && !s.ends_with('/'))
            .map(PathBuf::from)
    }

    /// Path relative to the project root, with `/` separators.
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Every secret file pair that has a ciphertext on disk.
    pub fn secret_files(&self) -> Result<Vec<SecretFile>> {
        let ciphertexts = resolve::resolve(&[], &self.root, FileKind::Ciphertext)?;
        Ok(ciphertexts
            .into_iter()
            .filter_map(|c| Self::plain_path(&c).map(|p| SecretFile::new(p, c)))
            .collect())
    }

    /// Secret file pair for a root-relative plaintext path.
    pub fn secret_file(&self, relative: &str) -> SecretFile {
        let plain = self.root.join(relative);
        let cipher = Self::cipher_path(&plain);
        SecretFile::new(plain, cipher)
    }
}

fn list_dir(dir: &Path) -> Result<BTreeSet<DeviceId>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e.into()),
    };

    let mut ids = BTreeSet::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if validate_device_id(&name).is_err() {
            warn!(dir = %dir.display(), name, "skipping file with an invalid device id");
            continue;
        }
        ids.insert(name);
    }
    Ok(ids)
}

/// A staged mutation.
#[derive(Debug, Clone)]
enum Change {
    Write {
        path: PathBuf,
        contents: Vec<u8>,
        mode: Option<u32>,
    },
    Remove {
        path: PathBuf,
    },
}

impl Change {
    fn path(&self) -> &Path {
        match self {
            Change::Write { path, .. } | Change::Remove { path } => path,
        }
    }
}

impl Drop for Change {
    fn drop(&mut self) {
        if let Change::Write { contents, .. } = self {
            contents.zeroize();
        }
    }
}

/// Writes and removals staged in memory and applied in order by [`commit`].
///
/// Each change is an atomic file replacement. If one fails, changes already
/// applied are rolled back to their previous contents.
///
/// [`commit`]: Changeset::commit
#[derive(Debug, Default, Clone)]
pub struct Changeset {
    changes: Vec<Change>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file write.
    pub fn write(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.changes.push(Change::Write {
            path: path.into(),
            contents: contents.into(),
            mode: None,
        });
    }

    /// Stage a file write with Unix permissions.
    pub fn write_with_mode(
        &mut self,
        path: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
        mode: u32,
    ) {
        self.changes.push(Change::Write {
            path: path.into(),
            contents: contents.into(),
            mode: Some(mode),
        });
    }

    /// Stage a file removal.
    pub fn remove(&mut self, path: impl Into<PathBuf>) {
        self.changes.push(Change::Remove { path: path.into() });
    }

    /// Append another changeset.
    pub fn extend(&mut self, other: Changeset) {
        self.changes.extend(other.changes);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Paths written by this changeset.
    pub fn writes(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().filter_map(|c| match c {
            Change::Write { path, .. } => Some(path.as_path()),
            Change::Remove { .. } => None,
        })
    }

    /// Paths removed by this changeset.
    pub fn removals(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().filter_map(|c| match c {
            Change::Remove { path } => Some(path.as_path()),
            Change::Write { .. } => None,
        })
    }

    /// Apply every change in order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CommitFailed` naming the failed path and any
    /// earlier change that could not be restored.
    pub fn commit(self) -> Result<()> {
        debug!(changes = self.changes.len(), "committing changeset");

        let mut undo: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(self.changes.len());
        for change in &self.changes {
            let previous = match fs::read(change.path()) {
                Ok(bytes) => Some(bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(e) => return Err(rollback(undo, change.path(), e)),
            };

            let applied = match change {
                Change::Write {
                    path,
                    contents,
                    mode,
                } => atomic::write(path, contents, *mode),
                Change::Remove { path } => atomic::remove(path),
            };

            match applied {
                Ok(()) => undo.push((change.path().to_path_buf(), previous)),
                Err(e) => return Err(rollback(undo, change.path(), e)),
            }
        }
        Ok(())
    }
}

/// Restore applied changes in reverse order and build the commit error.
fn rollback(
    undo: Vec<(PathBuf, Option<Vec<u8>>)>,
    failed: &Path,
    source: io::Error,
) -> crate::error::Error {
    warn!(path = %failed.display(), error = %source, "write failed, rolling back");

    let mut stranded = Vec::new();
    for (path, previous) in undo.into_iter().rev() {
        let restored = match &previous {
            Some(bytes) => atomic::write(&path, bytes, None),
            None => atomic::remove(&path),
        };
        if restored.is_err() {
            stranded.push(path);
        }
    }

    StoreError::CommitFailed {
        failed: failed.to_path_buf(),
        stranded,
        source,
    }
    .into()
}
