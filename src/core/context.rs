//! Per-invocation context.
//!
//! Everything an operation needs to know about where it runs and who runs
//! it, passed explicitly instead of read from globals.

use std::path::PathBuf;

use crate::core::audit::{AuditSink, JsonLines};
use crate::core::config::{self, UserConfig};
use crate::core::confirm::{Deny, Prompt};
use crate::core::constants;
use crate::core::domain::User;
use crate::core::store::{Filesystem, Store};
use crate::error::Result;

/// Invocation context.
pub struct Context {
    /// Project root
    pub root: PathBuf,
    /// Local cellar home (`~/.cellar`)
    pub home: PathBuf,
    pub user: User,
    /// Resolve and validate everything, write nothing.
    pub dry_run: bool,
    prompt: Box<dyn Prompt>,
    store: Box<dyn Store>,
    audit: Box<dyn AuditSink>,
}

impl Context {
    /// Context with filesystem key storage, a JSON-lines audit log in the
    /// store, and a prompt that declines.
    pub fn new(root: impl Into<PathBuf>, home: impl Into<PathBuf>, user: User) -> Self {
        let root = root.into();
        let home = home.into();
        let audit_log = root
            .join(constants::STORE_DIR)
            .join(constants::AUDIT_LOG);
        Self {
            store: Box::new(Filesystem::new(&home)),
            audit: Box::new(JsonLines::new(audit_log)),
            prompt: Box::new(Deny),
            dry_run: false,
            root,
            home,
            user,
        }
    }

    /// Context for the current directory and the user's home.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoHome` or a config error if the user config is
    /// unreadable.
    pub fn discover() -> Result<Self> {
        let root = std::env::current_dir()?;
        let root = root.canonicalize().unwrap_or(root);
        let home = config::default_home()?;
        let user = UserConfig::load_or_create(&home)?.user;
        Ok(Self::new(root, home, user))
    }

    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn with_store(mut self, store: impl Store + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_audit(mut self, audit: impl AuditSink + 'static) -> Self {
        self.audit = Box::new(audit);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn prompt(&self) -> &dyn Prompt {
        self.prompt.as_ref()
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn audit(&self) -> &dyn AuditSink {
        self.audit.as_ref()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("home", &self.home)
            .field("user", &self.user)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}
