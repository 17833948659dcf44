//! Consistency model and health checks.
//!
//! Device status is never stored; it is derived from which artifacts exist.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::info;

use super::Vault;
use crate::core::audit::AuditEvent;
use crate::core::cipher::Fingerprint;
use crate::core::config::UserConfig;
use crate::core::confirm;
use crate::core::constants;
use crate::core::context::Context;
use crate::core::domain::{Device, DeviceStatus, Report};
use crate::core::gitignore;
use crate::core::layout::Changeset;
use crate::core::types::DeviceId;
use crate::error::{AccessError, ErrorKind, Result};

impl Vault<'_> {
    /// Derived status of a device.
    pub fn status(&self, device: &str) -> DeviceStatus {
        DeviceStatus::derive(
            self.layout.has_public_key(device),
            self.layout.has_wrapped_key(device),
        )
    }

    /// Every device known by artifact or registry entry.
    pub fn devices(&self) -> Result<Vec<Device>> {
        let mut ids: BTreeSet<DeviceId> = self.layout.list_public_keys()?;
        ids.extend(self.layout.list_wrapped_keys()?);
        ids.extend(self.registry.devices.keys().cloned());

        Ok(ids
            .into_iter()
            .map(|id| {
                let status = self.status(&id);
                let member = self.registry.devices.get(&id);
                Device::new(id, status, member)
            })
            .collect())
    }

    /// Devices with a wrapped key but no public key.
    pub fn find_orphans(&self) -> Result<Vec<DeviceId>> {
        let public = self.layout.list_public_keys()?;
        Ok(self
            .layout
            .list_wrapped_keys()?
            .into_iter()
            .filter(|id| !public.contains(id))
            .collect())
    }

    /// Delete orphan wrapped keys. Pending devices are never touched.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Declined` if the confirmation is declined.
    pub fn clean(&self, force: bool) -> Result<Vec<DeviceId>> {
        let orphans = self.find_orphans()?;
        if orphans.is_empty() {
            return Ok(orphans);
        }

        confirm::require(
            self.ctx,
            force,
            &format!("Delete {} orphaned wrapped key(s)?", orphans.len()),
            || AccessError::Declined("clean".to_string()).into(),
        )?;

        let mut changes = Changeset::new();
        for id in &orphans {
            changes.remove(self.layout.wrapped_key_path(id)?);
        }
        let ctx = self.ctx;
        self.commit(changes, || {
            AuditEvent::new(&ctx.user, "clean").field("devices", &orphans)
        })?;

        info!(removed = orphans.len(), "orphans cleaned");
        Ok(orphans)
    }

    /// Run every health check. Never fails; problems become check results.
    pub fn doctor(ctx: &Context) -> Report {
        let mut report = Report::default();

        match UserConfig::load(&ctx.home) {
            Ok(_) => report.pass("user config", "user config parses"),
            Err(e) if e.kind() == ErrorKind::NotInitialized => report.warn(
                "user config",
                "no user config yet",
                Some("it is created on first use"),
            ),
            Err(e) => report.error("user config", e.to_string(), None),
        }

        let vault = match Vault::open(ctx) {
            Ok(v) => {
                report.pass(
                    "registry",
                    format!(
                        "project '{}' with {} registered device(s)",
                        v.registry.project.name,
                        v.registry.devices.len()
                    ),
                );
                v
            }
            Err(e) => {
                report.error("registry", e.to_string(), e.suggestion());
                return report;
            }
        };

        vault.check_local_key(&mut report);
        vault.check_pairing(&mut report);
        vault.check_files(&mut report);
        report
    }

    fn check_local_key(&self, report: &mut Report) {
        let store = self.ctx.store();
        let project = self.project_id();

        if !store.has_key(project) {
            report.error(
                "private key",
                "no private key for this project on this machine",
                Some("run: cellar create"),
            );
            return;
        }
        let key_path = store.key_path(project);
        match crate::core::store::validate_file_permissions(&key_path, constants::PRIVATE_KEY_MODE)
        {
            Ok(()) => report.pass("private key", "private key present with mode 600"),
            Err(e) => report.error(
                "private key",
                e.to_string(),
                Some(format!("run: chmod 600 {}", key_path.display()).as_str()),
            ),
        }

        let identity = match self.identity() {
            Ok(id) => id,
            Err(e) => {
                report.error("access", e.to_string(), e.suggestion());
                return;
            }
        };
        let device = identity.device_id();
        match self.status(device) {
            DeviceStatus::Active => match self.project_key(&identity) {
                Ok(key) => report.pass(
                    "access",
                    format!("device {device} can unwrap project key {}", key.fingerprint()),
                ),
                Err(e) => report.error("access", e.to_string(), e.suggestion()),
            },
            DeviceStatus::Pending => report.warn(
                "access",
                format!("device {device} is waiting to be registered"),
                Some(format!("ask a teammate to run: cellar register {device}").as_str()),
            ),
            status => report.error(
                "access",
                format!("device {device} is {status}; its public key is missing"),
                Some("run: cellar create --force"),
            ),
        }
    }

    fn check_pairing(&self, report: &mut Report) {
        let devices = match self.devices() {
            Ok(d) => d,
            Err(e) => {
                report.error("devices", e.to_string(), None);
                return;
            }
        };

        let pending: Vec<&str> = devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Pending)
            .map(|d| d.id.as_str())
            .collect();
        let orphans: Vec<&str> = devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Orphan)
            .map(|d| d.id.as_str())
            .collect();
        let unregistered: Vec<&str> = devices
            .iter()
            .filter(|d| d.status != DeviceStatus::Absent && d.email.is_none())
            .map(|d| d.id.as_str())
            .collect();
        let stale: Vec<&str> = devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Absent)
            .map(|d| d.id.as_str())
            .collect();

        if pending.is_empty() && orphans.is_empty() {
            report.pass("key pairing", "every public key has a wrapped key");
        }
        if !pending.is_empty() {
            report.warn(
                "key pairing",
                format!("pending device(s): {}", pending.join(", ")),
                Some("run: cellar register <device>"),
            );
        }
        if !orphans.is_empty() {
            report.warn(
                "key pairing",
                format!("orphaned wrapped key(s): {}", orphans.join(", ")),
                Some("run: cellar clean"),
            );
        }

        if unregistered.is_empty() && stale.is_empty() {
            report.pass("registry entries", "registry matches store artifacts");
        }
        if !unregistered.is_empty() {
            report.warn(
                "registry entries",
                format!("artifacts without registry entry: {}", unregistered.join(", ")),
                None,
            );
        }
        if !stale.is_empty() {
            report.warn(
                "registry entries",
                format!("registered devices without keys: {}", stale.join(", ")),
                None,
            );
        }
    }

    fn check_files(&self, report: &mut Report) {
        let secret_files = match self.layout.secret_files() {
            Ok(f) => f,
            Err(e) => {
                report.error("ciphertexts", e.to_string(), None);
                return;
            }
        };

        let current = self
            .identity()
            .and_then(|id| self.project_key(&id))
            .ok()
            .map(|k| k.fingerprint());
        let mut stale = Vec::new();
        for file in &secret_files {
            let fingerprint = fs::read(file.ciphertext())
                .ok()
                .and_then(|bytes| Fingerprint::of_ciphertext(&bytes));
            let ok = match (fingerprint, current) {
                (None, _) => false,
                (Some(found), Some(expected)) => found == expected,
                (Some(_), None) => true,
            };
            if !ok {
                stale.push(self.layout.relative(file.ciphertext()));
            }
        }
        if stale.is_empty() {
            report.pass(
                "ciphertexts",
                format!("{} ciphertext(s) sealed under the current key", secret_files.len()),
            );
        } else {
            report.error(
                "ciphertexts",
                format!("not readable with the current key: {}", stale.join(", ")),
                Some("restore them from version control, or re-encrypt from plaintext"),
            );
        }

        let mut tracked: BTreeSet<String> = self.registry.files.clone();
        tracked.extend(secret_files.iter().filter_map(|f| {
            let rel = self.layout.relative(f.plaintext());
            (!rel.is_empty()).then_some(rel)
        }));

        let ignore = gitignore::read(&self.layout.gitignore_path()).unwrap_or_default();
        let exposed: Vec<&str> = tracked
            .iter()
            .filter(|f| !gitignore::is_ignored(&ignore, Path::new(f.as_str())))
            .map(String::as_str)
            .collect();
        if exposed.is_empty() {
            report.pass("gitignore", "plaintext secrets are ignored by git");
        } else {
            report.error(
                "gitignore",
                format!("plaintext not ignored by git: {}", exposed.join(", ")),
                Some("run: cellar encrypt (it adds the entries)"),
            );
        }

        let unencrypted: Vec<&str> = self
            .registry
            .files
            .iter()
            .filter(|f| {
                let file = self.layout.secret_file(f);
                file.has_plaintext() && !file.has_ciphertext()
            })
            .map(String::as_str)
            .collect();
        if !unencrypted.is_empty() {
            report.warn(
                "plaintext",
                format!("plaintext without ciphertext: {}", unencrypted.join(", ")),
                Some("run: cellar encrypt"),
            );
        }
    }
}
