//! The primary interface for cellar operations.
//!
//! A `Vault` is an opened project store. It owns the layout and registry and
//! borrows the invocation [`Context`]; every operation stages its writes in a
//! [`Changeset`] and commits them last, skipping the commit on a dry run.

mod files;
mod health;
mod lifecycle;

pub use lifecycle::RevokeOptions;

use tracing::debug;

use crate::core::audit::{self, AuditEvent};
use crate::core::cipher::{self, ProjectKey};
use crate::core::context::Context;
use crate::core::domain::{Identity, SecretFile};
use crate::core::gitignore;
use crate::core::layout::{Changeset, Layout};
use crate::core::registry::Registry;
use crate::error::{AccessError, ConfigError, Result};

/// An opened project store.
pub struct Vault<'a> {
    ctx: &'a Context,
    layout: Layout,
    registry: Registry,
}

impl std::fmt::Debug for Vault<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("root", &self.layout.root())
            .field("project", &self.registry.project)
            .finish_non_exhaustive()
    }
}

impl<'a> Vault<'a> {
    /// Open the store at the context's project root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotInitialized` if there is no store, or
    /// `ConfigError::Invalid` if the registry is malformed.
    pub fn open(ctx: &'a Context) -> Result<Self> {
        let layout = Layout::new(&ctx.root);
        if !layout.exists() {
            return Err(ConfigError::NotInitialized.into());
        }
        let registry = Registry::load(&layout.registry_path())?;
        Ok(Self {
            ctx,
            layout,
            registry,
        })
    }

    /// Initialize a new store.
    ///
    /// Writes the registry and adds the temp-file entries to `.gitignore`.
    /// `name` defaults to the project directory name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::AlreadyInitialized` if a store exists.
    pub fn init(ctx: &'a Context, name: Option<&str>) -> Result<Self> {
        let layout = Layout::new(&ctx.root);
        if layout.exists() {
            return Err(ConfigError::AlreadyInitialized(layout.registry_path()).into());
        }

        let name = name.map(str::to_string).unwrap_or_else(|| {
            ctx.root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string())
        });
        let registry = Registry::new(name);

        let mut changes = Changeset::new();
        changes.write(layout.registry_path(), registry.to_toml()?);
        let existing = gitignore::read(&layout.gitignore_path())?;
        if let Some(updated) = gitignore::with_entries(&existing, gitignore::INIT_ENTRIES) {
            changes.write(layout.gitignore_path(), updated);
        }

        let vault = Self {
            ctx,
            layout,
            registry,
        };
        vault.commit(changes, || {
            AuditEvent::new(&ctx.user, "init")
                .field("project", &vault.registry.project.id)
                .field("name", &vault.registry.project.name)
        })?;
        Ok(vault)
    }

    pub fn context(&self) -> &Context {
        self.ctx
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn project_id(&self) -> &str {
        &self.registry.project.id
    }

    /// Load the invoking device's identity from local storage.
    pub fn identity(&self) -> Result<Identity> {
        self.ctx.store().load(self.project_id())
    }

    /// Unwrap the current project key with a device identity.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::NoAccess` if the device has no wrapped key, or
    /// `CipherError::DecryptionFailed` if it cannot be unwrapped.
    pub fn project_key(&self, identity: &Identity) -> Result<ProjectKey> {
        let device = identity.device_id();
        let wrapped = self
            .layout
            .read_wrapped_key(device)?
            .ok_or_else(|| AccessError::NoAccess(device.to_string()))?;
        cipher::unwrap(&wrapped, identity.as_age())
    }

    /// No device holds the project key yet and nothing is encrypted.
    pub(super) fn is_bootstrap(&self) -> Result<bool> {
        Ok(self.layout.list_wrapped_keys()?.is_empty() && self.layout.secret_files()?.is_empty())
    }

    /// Secret files the registry tracks, as pairs.
    pub(super) fn tracked_files(&self) -> Vec<SecretFile> {
        self.registry
            .files
            .iter()
            .map(|f| self.layout.secret_file(f))
            .collect()
    }

    /// Stage the current registry.
    pub(super) fn stage_registry(&self, changes: &mut Changeset) -> Result<()> {
        changes.write(self.layout.registry_path(), self.registry.to_toml()?);
        Ok(())
    }

    /// Commit staged changes and emit an audit event, unless dry-running.
    pub(super) fn commit(
        &self,
        changes: Changeset,
        event: impl FnOnce() -> AuditEvent,
    ) -> Result<()> {
        if self.ctx.dry_run {
            debug!(changes = changes.len(), "dry run: skipping commit");
            return Ok(());
        }
        changes.commit()?;
        audit::emit(self.ctx.audit(), event());
        Ok(())
    }
}
