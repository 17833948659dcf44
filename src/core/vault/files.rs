//! Selective encrypt and decrypt.
//!
//! Every file is processed in memory and its outcome recorded in a
//! [`BatchReport`]; the outputs are committed together at the end. A file
//! whose content already matches is left untouched.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::Vault;
use crate::core::audit::AuditEvent;
use crate::core::cipher::ProjectKey;
use crate::core::constants;
use crate::core::domain::{BatchReport, Identity};
use crate::core::gitignore;
use crate::core::layout::{Changeset, Layout};
use crate::core::resolve::{self, FileKind};
use crate::error::{Error, Result};

impl Vault<'_> {
    /// Encrypt plaintext files to their `.enc` siblings.
    ///
    /// With no patterns, re-encrypts every tracked secret and every
    /// plaintext whose ciphertext exists. New paths are added to the
    /// registry and to `.gitignore`.
    ///
    /// # Errors
    ///
    /// Fails before touching any file on a resolution error or when the
    /// invoker has no access, and writes nothing if the final commit fails.
    /// Per-file failures are reported, not returned.
    pub fn encrypt(&mut self, identity: &Identity, patterns: &[String]) -> Result<BatchReport> {
        let key = self.project_key(identity)?;
        let targets = self.encrypt_targets(patterns)?;
        debug!(files = targets.len(), "encrypting");

        let mut changes = Changeset::new();
        let mut report = BatchReport::default();
        let mut tracked = false;
        for plain in targets {
            match self.seal_file(&key, &plain) {
                Ok(Some(sealed)) => {
                    changes.write(Layout::cipher_path(&plain), sealed);
                    report.succeeded.push(plain.clone());
                }
                Ok(None) => report.unchanged.push(plain.clone()),
                Err(e) => {
                    warn!(path = %plain.display(), error = %e, "encrypt failed");
                    report.record_failure(plain, &e);
                    continue;
                }
            }
            tracked |= self.registry.files.insert(self.layout.relative(&plain));
        }

        if tracked {
            self.stage_registry(&mut changes)?;
        }
        self.stage_gitignore(&mut changes)?;

        if changes.is_empty() {
            return Ok(report);
        }
        let ctx = self.ctx;
        let written: Vec<String> = report
            .succeeded
            .iter()
            .map(|p| self.layout.relative(p))
            .collect();
        self.commit(changes, || {
            AuditEvent::new(&ctx.user, "encrypt")
                .field("files", &written)
                .field("failed", report.failed.len())
        })?;
        Ok(report)
    }

    /// Decrypt ciphertexts to their plaintext siblings (mode 0600).
    ///
    /// With no patterns, decrypts every ciphertext in the project.
    pub fn decrypt(&self, identity: &Identity, patterns: &[String]) -> Result<BatchReport> {
        let key = self.project_key(identity)?;
        let targets = resolve::resolve(patterns, self.layout.root(), FileKind::Ciphertext)?;
        debug!(files = targets.len(), "decrypting");

        let mut changes = Changeset::new();
        let mut report = BatchReport::default();
        for cipher in targets {
            let Some(plain) = Layout::plain_path(&cipher) else {
                continue;
            };
            match self.open_file(&key, &cipher, &plain) {
                Ok(Some(contents)) => {
                    changes.write_with_mode(&plain, &contents[..], constants::PRIVATE_KEY_MODE);
                    report.succeeded.push(plain);
                }
                Ok(None) => report.unchanged.push(plain),
                Err(e) => {
                    warn!(path = %cipher.display(), error = %e, "decrypt failed");
                    report.record_failure(cipher, &e);
                }
            }
        }

        if !changes.is_empty() {
            let ctx = self.ctx;
            let written: Vec<String> = report
                .succeeded
                .iter()
                .map(|p| self.layout.relative(p))
                .collect();
            self.commit(changes, || {
                AuditEvent::new(&ctx.user, "decrypt")
                    .field("files", &written)
                    .field("failed", report.failed.len())
            })?;
        }
        Ok(report)
    }

    fn encrypt_targets(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
        if !patterns.is_empty() {
            return resolve::resolve(patterns, self.layout.root(), FileKind::Plaintext);
        }

        let mut targets = BTreeSet::new();
        for file in self.tracked_files().into_iter().chain(self.layout.secret_files()?) {
            if file.has_plaintext() {
                targets.insert(file.plaintext().to_path_buf());
            }
        }
        Ok(targets.into_iter().collect())
    }

    /// New ciphertext for a plaintext, or `None` if the current one matches.
    fn seal_file(&self, key: &ProjectKey, plain: &Path) -> Result<Option<Vec<u8>>> {
        let contents =
            Zeroizing::new(fs::read(plain).map_err(|e| Error::from(e).in_file(plain))?);
        let cipher = Layout::cipher_path(plain);

        if let Ok(existing) = fs::read(&cipher) {
            if let Ok(current) = key.decrypt(&existing) {
                if current[..] == contents[..] {
                    return Ok(None);
                }
            }
        }

        key.encrypt(&contents).map(Some).map_err(|e| e.in_file(plain))
    }

    /// Plaintext of a ciphertext, or `None` if the file on disk matches.
    fn open_file(
        &self,
        key: &ProjectKey,
        cipher: &Path,
        plain: &Path,
    ) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let sealed = fs::read(cipher).map_err(|e| Error::from(e).in_file(cipher))?;
        let contents = key.decrypt(&sealed).map_err(|e| e.in_file(cipher))?;

        if let Ok(existing) = fs::read(plain) {
            let existing = Zeroizing::new(existing);
            if existing[..] == contents[..] {
                return Ok(None);
            }
        }
        Ok(Some(contents))
    }

    /// Stage `.gitignore` entries for tracked plaintexts not yet ignored.
    fn stage_gitignore(&self, changes: &mut Changeset) -> Result<()> {
        let path = self.layout.gitignore_path();
        let existing = gitignore::read(&path)?;
        let entries: Vec<String> = self
            .registry
            .files
            .iter()
            .filter(|f| !gitignore::is_ignored(&existing, Path::new(f)))
            .map(|f| gitignore::entry_for(f))
            .collect();
        if let Some(updated) = gitignore::with_entries(&existing, &entries) {
            changes.write(path, updated);
        }
        Ok(())
    }
}
