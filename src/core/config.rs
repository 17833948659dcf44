//! User configuration.
//!
//! Handles reading and writing `~/.cellar/config.toml`, which records who
//! the local user is. Also hosts the TOML helpers shared with the registry.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::atomic;
use crate::core::domain::User;
use crate::error::{ConfigError, Result, StoreError, ValidationError};

/// Local user configuration stored in `~/.cellar/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub user: User,
}

impl UserConfig {
    /// Path to the user config below a cellar home.
    pub fn path(home: &Path) -> PathBuf {
        home.join(constants::USER_CONFIG_FILE)
    }

    /// Load the user config, creating a default one on first use.
    ///
    /// The default takes the user name from the OS account and synthesizes
    /// an email from the user and host names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the file exists but is malformed.
    pub fn load_or_create(home: &Path) -> Result<Self> {
        let path = Self::path(home);
        if path.exists() {
            return Self::load(home);
        }

        let config = Self {
            user: User::new(default_name(), default_email()),
        };
        config.save(home)?;
        debug!(path = %path.display(), user = %config.user.email, "created user config");
        Ok(config)
    }

    /// Load an existing user config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotInitialized` if the file doesn't exist,
    /// or `ConfigError::Invalid` if the TOML is malformed.
    pub fn load(home: &Path) -> Result<Self> {
        let path = Self::path(home);
        debug!(path = %path.display(), "loading user config");

        let config: Self = read_toml(&path)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the user config atomically.
    pub fn save(&self, home: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        atomic::write(&Self::path(home), contents.as_bytes(), None)
            .map_err(StoreError::WriteFailed)?;
        Ok(())
    }

    /// Validate field contents.
    pub fn validate(&self) -> Result<()> {
        if self.user.id.is_empty() {
            return Err(ConfigError::MissingField { field: "user.id" }.into());
        }
        validate_email(&self.user.email)?;
        Ok(())
    }
}

/// Resolve the cellar home directory (`~/.cellar`).
///
/// # Errors
///
/// Returns `StoreError::NoHome` if the home directory cannot be determined.
pub fn default_home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(StoreError::NoHome)?;
    Ok(home.join(constants::HOME_DIR))
}

fn default_name() -> String {
    let real = whoami::realname();
    if real.trim().is_empty() {
        whoami::username()
    } else {
        real
    }
}

fn default_email() -> String {
    let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
    format!("{}@{}", whoami::username(), host)
}

/// Validate an email address enough to catch typos.
pub fn validate_email(email: &str) -> Result<()> {
    let invalid = |reason: &str| ValidationError::InvalidName {
        field: "email",
        value: email.to_string(),
        reason: reason.to_string(),
    };

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid("missing '@'").into());
    };
    if local.is_empty() || domain.is_empty() {
        return Err(invalid("empty local part or domain").into());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("contains whitespace").into());
    }
    Ok(())
}

/// Read and parse a TOML file, reporting parse errors with line and column.
///
/// # Errors
///
/// Returns `ConfigError::NotInitialized` if the file is missing,
/// `ConfigError::ReadFile` on I/O failure, or `ConfigError::Invalid`.
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotInitialized.into())
        }
        Err(e) => return Err(ConfigError::ReadFile(e).into()),
    };
    parse_toml(path, &contents)
}

/// Parse TOML text that came from `path`.
pub fn parse_toml<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T> {
    toml::from_str(contents).map_err(|e| {
        let (line, column) = e
            .span()
            .map(|span| line_column(contents, span.start))
            .unwrap_or((0, 0));
        ConfigError::Invalid {
            path: path.to_path_buf(),
            line,
            column,
            message: e.message().to_string(),
        }
        .into()
    })
}

/// 1-based line and column of a byte offset.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|nl| before[nl + 1..].chars().count())
        .unwrap_or_else(|| before.chars().count())
        + 1;
    (line, column)
}
