//! Key lifecycle operations.
//!
//! Create, register, rotate, sync and revoke. Each operation validates and
//! computes everything in memory, then commits one changeset.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::Vault;
use crate::core::audit::AuditEvent;
use crate::core::cipher::{self, ProjectKey};
use crate::core::config::validate_email;
use crate::core::confirm;
use crate::core::domain::{Device, DeviceStatus, Identity, SyncResult};
use crate::core::layout::Changeset;
use crate::core::registry::{validate_device_id, Member};
use crate::core::types::DeviceId;
use crate::error::{AccessError, Error, ResolveError, Result};

/// Options for revocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevokeOptions {
    /// Skip the confirmation prompt.
    pub force: bool,
    /// Allow revoking the last active device.
    pub allow_lockout: bool,
}

fn new_device_id() -> DeviceId {
    uuid::Uuid::new_v4().to_string()
}

impl Vault<'_> {
    fn member(&self, name: String) -> Member {
        Member {
            user_id: self.ctx.user.id.clone(),
            email: self.ctx.user.email.clone(),
            name,
            added: Utc::now(),
        }
    }

    /// Create a keypair for this machine.
    ///
    /// The public key is committed and the device is recorded in the
    /// registry; only then is the private key saved locally. The device is
    /// pending until someone with access registers it.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::AlreadyExists` if this machine already has a key
    /// for the project and `force` is not set.
    pub fn create(&mut self, name: Option<&str>, force: bool) -> Result<Identity> {
        let ctx = self.ctx;
        let project = self.project_id().to_string();
        let store = ctx.store();

        if store.has_key(&project) && !force {
            return Err(AccessError::AlreadyExists(format!(
                "a device key for project '{}'",
                self.registry.project.name
            ))
            .into());
        }

        // A forced re-create keeps the device id so its artifacts are replaced.
        let device = match store.device_id(&project)? {
            Some(id) if force => id,
            _ => new_device_id(),
        };
        let identity = Identity::generate(device.clone());

        let mut changes = Changeset::new();
        changes.write(
            self.layout.public_key_path(&device)?,
            format!("{}\n", identity.public_key()),
        );
        if self.layout.has_wrapped_key(&device) {
            debug!(device = %device, "removing stale wrapped key");
            changes.remove(self.layout.wrapped_key_path(&device)?);
        }

        let name = name.map(str::to_string).unwrap_or_else(whoami::devicename);
        let member = self.member(name);
        self.registry.devices.insert(device.clone(), member);
        self.stage_registry(&mut changes)?;

        // The new key waits beside the old one until its public half is committed.
        if !ctx.dry_run {
            store.stage(&project, &identity)?;
        }
        if let Err(e) = self.commit(changes, || {
            AuditEvent::new(&ctx.user, "create").field("device", &device)
        }) {
            if let Err(discard) = store.discard(&project) {
                warn!(error = %discard, "failed to remove staged key");
            }
            return Err(e);
        }
        if !ctx.dry_run {
            store.save(&project, &identity)?;
            store.discard(&project)?;
        }

        info!(device = %device, "device created");
        Ok(identity)
    }

    /// Project key to hand out, and whether this is the first grant.
    ///
    /// The first grant in a fresh store generates the project key; only the
    /// granter's own device may receive it.
    fn grant_key(&self, granter: &Identity, grantees: &[&str]) -> Result<(ProjectKey, bool)> {
        if !self.is_bootstrap()? {
            return Ok((self.project_key(granter)?, false));
        }

        if grantees.iter().any(|g| *g != granter.device_id()) {
            return Err(AccessError::PermissionDenied(
                "no device has access yet; register your own device first".to_string(),
            )
            .into());
        }
        let committed = self.layout.read_public_key(granter.device_id())?;
        if committed != granter.public_key() {
            return Err(AccessError::PermissionDenied(format!(
                "committed public key for {} does not match the local private key",
                granter.device_id()
            ))
            .into());
        }
        debug!(device = granter.device_id(), "bootstrapping project key");
        Ok((ProjectKey::generate(), true))
    }

    /// Stage a device's public key and a wrapped copy of `key`.
    fn stage_grant(
        &self,
        changes: &mut Changeset,
        key: &ProjectKey,
        device: &str,
        public_key: &str,
        force: bool,
    ) -> Result<()> {
        let recipient = cipher::parse_recipient(public_key)?;

        if self.status(device) == DeviceStatus::Active {
            confirm::require(
                self.ctx,
                force,
                &format!("Device {device} already has access. Wrap the project key again?"),
                || AccessError::AlreadyExists(format!("device {device}")).into(),
            )?;
        }

        let wrapped = cipher::wrap(key, &recipient)?;
        changes.write(
            self.layout.public_key_path(device)?,
            format!("{}\n", public_key.trim()),
        );
        changes.write(self.layout.wrapped_key_path(device)?, wrapped.as_str());
        Ok(())
    }

    /// Grant a pending device access.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `device` is not a plain device
    /// id, `AccessError::DeviceNotFound` if the device has no public key,
    /// `AccessError::NoAccess` if the granter cannot unwrap the project key,
    /// or `AccessError::AlreadyExists` if the device is active and the
    /// confirmation is declined.
    pub fn register(&mut self, granter: &Identity, device: &str, force: bool) -> Result<Device> {
        validate_device_id(device)?;
        let public_key = self.layout.read_public_key(device)?;
        let (key, bootstrap) = self.grant_key(granter, &[device])?;

        let mut changes = Changeset::new();
        self.stage_grant(&mut changes, &key, device, &public_key, force)?;

        if !self.registry.devices.contains_key(device) {
            warn!(device, "public key has no registry entry, recording it without an owner");
            self.registry.devices.insert(
                device.to_string(),
                Member {
                    user_id: String::new(),
                    email: String::new(),
                    name: device.to_string(),
                    added: Utc::now(),
                },
            );
        }
        self.stage_registry(&mut changes)?;

        let ctx = self.ctx;
        self.commit(changes, || {
            AuditEvent::new(&ctx.user, "register")
                .field("device", device)
                .field("bootstrap", bootstrap)
        })?;

        info!(device, bootstrap, "device registered");
        Ok(Device::new(
            device.to_string(),
            DeviceStatus::Active,
            self.registry.devices.get(device),
        ))
    }

    /// Grant every pending device of a user access.
    ///
    /// With `force`, already-active devices are wrapped again too.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::UserNotFound` if no device is registered to
    /// `email`, or `AccessError::AlreadyExists` if none is pending.
    pub fn register_user(
        &mut self,
        granter: &Identity,
        email: &str,
        force: bool,
    ) -> Result<Vec<Device>> {
        let devices = self.registry.devices_of(email);
        if devices.is_empty() {
            return Err(AccessError::UserNotFound(email.to_string()).into());
        }

        let targets: Vec<DeviceId> = devices
            .into_iter()
            .filter(|d| match self.status(d) {
                DeviceStatus::Pending => true,
                DeviceStatus::Active => force,
                DeviceStatus::Orphan | DeviceStatus::Absent => false,
            })
            .collect();
        if targets.is_empty() {
            return Err(
                AccessError::AlreadyExists(format!("access for every device of {email}")).into(),
            );
        }

        let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
        let (key, bootstrap) = self.grant_key(granter, &refs)?;

        let mut changes = Changeset::new();
        for device in &targets {
            let public_key = self.layout.read_public_key(device)?;
            self.stage_grant(&mut changes, &key, device, &public_key, true)?;
        }
        self.stage_registry(&mut changes)?;

        let ctx = self.ctx;
        self.commit(changes, || {
            AuditEvent::new(&ctx.user, "register")
                .field("email", email)
                .field("devices", &targets)
                .field("bootstrap", bootstrap)
        })?;

        info!(email, devices = targets.len(), "user registered");
        Ok(targets
            .iter()
            .map(|d| Device::new(d.clone(), DeviceStatus::Active, self.registry.devices.get(d)))
            .collect())
    }

    /// Grant access to a public key exchanged out of band.
    ///
    /// A key already committed for some device re-registers that device.
    /// Otherwise a new device id is minted and its public key, wrapped key
    /// and registry entry are committed together.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::FileNotFound` if the file is missing, or
    /// `CipherError::InvalidPublicKey` if it holds no valid age public key.
    pub fn register_key_file(
        &mut self,
        granter: &Identity,
        path: &Path,
        email: &str,
        name: Option<&str>,
        force: bool,
    ) -> Result<Device> {
        let text = fs::read_to_string(path).map_err(|e| -> Error {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResolveError::FileNotFound(path.to_path_buf()).into()
            } else {
                Error::from(e).in_file(path)
            }
        })?;
        let public_key = text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .unwrap_or_default()
            .to_string();
        cipher::parse_recipient(&public_key)?;
        validate_email(email)?;

        let mut existing = None;
        for id in self.layout.list_public_keys()? {
            if self.layout.read_public_key(&id)? == public_key {
                existing = Some(id);
                break;
            }
        }
        let device = existing.unwrap_or_else(new_device_id);

        let (key, bootstrap) = self.grant_key(granter, &[&device])?;
        let mut changes = Changeset::new();
        self.stage_grant(&mut changes, &key, &device, &public_key, force)?;

        let user_id = self
            .registry
            .devices
            .values()
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .map(|m| m.user_id.clone())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let member = Member {
            user_id,
            email: email.to_string(),
            name: name.map(str::to_string).unwrap_or_else(|| device.clone()),
            added: Utc::now(),
        };
        self.registry.devices.entry(device.clone()).or_insert(member);
        self.stage_registry(&mut changes)?;

        let ctx = self.ctx;
        self.commit(changes, || {
            AuditEvent::new(&ctx.user, "register")
                .field("device", &device)
                .field("email", email)
                .field("key_file", path.display().to_string())
                .field("bootstrap", bootstrap)
        })?;

        info!(device = %device, email, "key file registered");
        Ok(Device::new(
            device.clone(),
            DeviceStatus::Active,
            self.registry.devices.get(&device),
        ))
    }

    /// Replace this device's keypair.
    ///
    /// The new private key is staged locally, the committed public key and
    /// wrapped key are swapped, and only then is the staged key promoted.
    /// Other devices are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Declined` if the confirmation is declined.
    pub fn rotate(&mut self, identity: &Identity, force: bool) -> Result<Identity> {
        let ctx = self.ctx;
        let device = identity.device_id().to_string();
        confirm::require(
            ctx,
            force,
            &format!("Replace the key for device {device}?"),
            || AccessError::Declined("key rotation".to_string()).into(),
        )?;

        let replacement = Identity::generate(device.clone());
        let mut changes = Changeset::new();
        changes.write(
            self.layout.public_key_path(&device)?,
            format!("{}\n", replacement.public_key()),
        );
        // A pending device only swaps its public key.
        if self.layout.has_wrapped_key(&device) {
            let key = self.project_key(identity)?;
            let wrapped = cipher::wrap(&key, &replacement.recipient())?;
            changes.write(self.layout.wrapped_key_path(&device)?, wrapped.as_str());
        }

        if ctx.dry_run {
            return Ok(replacement);
        }

        let project = self.project_id().to_string();
        let store = ctx.store();
        store.stage(&project, &replacement)?;
        if let Err(e) = changes.commit() {
            if let Err(discard) = store.discard(&project) {
                warn!(error = %discard, "failed to remove staged key");
            }
            return Err(e);
        }
        let archived = store.promote(&project)?;

        crate::core::audit::emit(
            ctx.audit(),
            AuditEvent::new(&ctx.user, "rotate").field("device", &device),
        );
        info!(device = %device, archived = ?archived, "device key rotated");
        Ok(replacement)
    }

    /// Re-key the project: new project key, wrapped for every active device
    /// not in `exclude`, and every ciphertext re-encrypted.
    ///
    /// # Errors
    ///
    /// Any failure before the commit leaves the store untouched.
    pub fn sync(&mut self, identity: &Identity, exclude: &[DeviceId]) -> Result<SyncResult> {
        let (changes, result) = self.plan_sync(identity, exclude)?;

        let ctx = self.ctx;
        self.commit(changes, || {
            AuditEvent::new(&ctx.user, "sync")
                .field("files", result.files.len())
                .field("devices", &result.devices)
                .field("excluded", exclude)
                .field("fingerprint", &result.fingerprint)
        })?;

        info!(
            files = result.files.len(),
            devices = result.devices.len(),
            "project re-keyed"
        );
        Ok(result)
    }

    /// Compute a sync entirely in memory.
    fn plan_sync(&self, identity: &Identity, exclude: &[DeviceId]) -> Result<(Changeset, SyncResult)> {
        let old = self.project_key(identity)?;

        let mut plaintexts: Vec<(std::path::PathBuf, Zeroizing<Vec<u8>>)> = Vec::new();
        for file in self.layout.secret_files()? {
            let path = file.ciphertext();
            let sealed = fs::read(path).map_err(|e| Error::from(e).in_file(path))?;
            let plain = old.decrypt(&sealed).map_err(|e| e.in_file(path))?;
            plaintexts.push((path.to_path_buf(), plain));
        }

        let public: BTreeSet<DeviceId> = self.layout.list_public_keys()?;
        let wrapped: BTreeSet<DeviceId> = self.layout.list_wrapped_keys()?;
        let mut recipients = Vec::new();
        for id in public.intersection(&wrapped) {
            if exclude.contains(id) {
                continue;
            }
            let recipient = cipher::parse_recipient(&self.layout.read_public_key(id)?)?;
            recipients.push((id.clone(), recipient));
        }
        if recipients.is_empty() {
            return Err(AccessError::LastDeviceRevocation(exclude.join(", ")).into());
        }

        let key = ProjectKey::generate();
        let mut changes = Changeset::new();
        for (path, plain) in &plaintexts {
            changes.write(path, key.encrypt(plain)?);
        }
        for (id, recipient) in &recipients {
            changes.write(
                self.layout.wrapped_key_path(id)?,
                cipher::wrap(&key, recipient)?.as_str(),
            );
        }
        for id in exclude.iter().filter(|id| wrapped.contains(*id)) {
            changes.remove(self.layout.wrapped_key_path(id)?);
        }

        let result = SyncResult {
            files: plaintexts.into_iter().map(|(path, _)| path).collect(),
            devices: recipients.into_iter().map(|(id, _)| id).collect(),
            fingerprint: key.fingerprint().to_string(),
            revoked: Vec::new(),
        };
        Ok((changes, result))
    }

    /// Revoke one device and re-key the project without it.
    pub fn revoke(
        &mut self,
        identity: &Identity,
        target: &str,
        opts: RevokeOptions,
    ) -> Result<SyncResult> {
        self.revoke_many(identity, &[target.to_string()], opts)
    }

    /// Revoke every device of a user, or one of them.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::UserNotFound` if no device belongs to `email`,
    /// or `AccessError::DeviceNotFound` if `device` is not one of them.
    pub fn revoke_user(
        &mut self,
        identity: &Identity,
        email: &str,
        device: Option<&str>,
        opts: RevokeOptions,
    ) -> Result<SyncResult> {
        let devices = self.registry.devices_of(email);
        if devices.is_empty() {
            return Err(AccessError::UserNotFound(email.to_string()).into());
        }
        let targets = match device {
            Some(d) if devices.iter().any(|x| x == d) => vec![d.to_string()],
            Some(d) => return Err(AccessError::DeviceNotFound(d.to_string()).into()),
            None => devices,
        };
        self.revoke_many(identity, &targets, opts)
    }

    /// Delete the targets' artifacts and registry entries and re-key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a target that is not a plain
    /// device id, or `AccessError::LastDeviceRevocation` if no active device
    /// would remain and `allow_lockout` is not set.
    pub fn revoke_many(
        &mut self,
        identity: &Identity,
        targets: &[DeviceId],
        opts: RevokeOptions,
    ) -> Result<SyncResult> {
        for target in targets {
            validate_device_id(target)?;
            if self.status(target) == DeviceStatus::Absent
                && !self.registry.devices.contains_key(target)
            {
                return Err(AccessError::DeviceNotFound(target.clone()).into());
            }
        }

        let remaining = self
            .layout
            .list_public_keys()?
            .into_iter()
            .filter(|d| !targets.contains(d) && self.status(d) == DeviceStatus::Active)
            .count();
        if remaining == 0 && !opts.allow_lockout {
            return Err(AccessError::LastDeviceRevocation(targets.join(", ")).into());
        }

        confirm::require(
            self.ctx,
            opts.force,
            &format!(
                "Revoke {}? Every secret file will be re-encrypted.",
                targets.join(", ")
            ),
            || AccessError::Declined("revocation".to_string()).into(),
        )?;

        let (mut changes, mut result) = if remaining == 0 {
            warn!("revoking the last active device; the project key becomes unrecoverable");
            let mut changes = Changeset::new();
            for target in targets.iter().filter(|t| self.layout.has_wrapped_key(t)) {
                changes.remove(self.layout.wrapped_key_path(target)?);
            }
            let result = SyncResult {
                files: Vec::new(),
                devices: Vec::new(),
                fingerprint: String::new(),
                revoked: Vec::new(),
            };
            (changes, result)
        } else {
            self.plan_sync(identity, targets)?
        };

        for target in targets {
            if self.layout.has_public_key(target) {
                changes.remove(self.layout.public_key_path(target)?);
            }
            self.registry.devices.remove(target);
        }
        self.stage_registry(&mut changes)?;
        result.revoked = targets.to_vec();

        let ctx = self.ctx;
        self.commit(changes, || {
            AuditEvent::new(&ctx.user, "revoke")
                .field("devices", targets)
                .field("files", result.files.len())
                .field("fingerprint", &result.fingerprint)
        })?;

        info!(devices = ?targets, "devices revoked");
        Ok(result)
    }
}
