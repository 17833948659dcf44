//! Error types.
//!
//! Every failure in cellar is one of a closed set of tagged kinds carrying
//! structured context. Rendering them for humans happens at the CLI edge.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

/// Configuration and registry errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("not initialized: no cellar store found in this directory")]
    NotInitialized,

    #[error("already initialized: {} exists", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("invalid config {}:{line}:{column}: {message}", path.display())]
    Invalid {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config: {0}")]
    ReadFile(std::io::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Local key storage and store artifact errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no private key found for project {0}")]
    NoPrivateKey(String),

    #[error("invalid key format in {}", .0.display())]
    InvalidFormat(PathBuf),

    #[error("failed to read key: {0}")]
    ReadFailed(std::io::Error),

    #[error("failed to write key: {0}")]
    WriteFailed(std::io::Error),

    #[error("unable to determine home directory")]
    NoHome,

    #[error("failed to write {}: {source} ({} earlier change(s) left in place)", failed.display(), stranded.len())]
    CommitFailed {
        failed: PathBuf,
        /// Earlier changes that could not be rolled back.
        stranded: Vec<PathBuf>,
        #[source]
        source: std::io::Error,
    },
}

/// Cryptographic failures, normalized so library diagnostics never leak.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("decryption failed: this key cannot unwrap the project key")]
    DecryptionFailed,

    #[error("authentication failed: ciphertext is corrupted or was encrypted under a different key")]
    AuthenticationFailed,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("encryption failed")]
    EncryptionFailed,
}

/// Access-control and lifecycle precondition errors.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("no access: device {0} has no wrapped project key")]
    NoAccess(String),

    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("refusing to revoke {0}: it is the last active device and the project would be unrecoverable")]
    LastDeviceRevocation(String),

    #[error("cancelled: {0}")]
    Declined(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

/// File resolution errors.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{} is not a {expected} file", path.display())]
    WrongFileType {
        path: PathBuf,
        expected: &'static str,
    },
}

/// Input validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("conflicting options: {0}")]
    ConflictingOptions(String),

    #[error("invalid {field} '{value}': {reason}")]
    InvalidName {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("insecure permissions on {path}: expected {expected}, found {actual}")]
    InvalidPermissions {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Closed set of error kinds, independent of context fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotInitialized,
    AlreadyExists,
    NoAccess,
    DecryptionFailed,
    AuthenticationFailed,
    UserOrDeviceNotFound,
    InvalidPattern,
    FileNotFound,
    WrongFileType,
    ConfigInvalid,
    ConflictingOptions,
    PermissionDenied,
    LastDeviceRevocation,
    Cancelled,
    Io,
}

impl Error {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(ConfigError::NotInitialized) => ErrorKind::NotInitialized,
            Error::Config(ConfigError::AlreadyInitialized(_)) => ErrorKind::AlreadyExists,
            Error::Config(ConfigError::ReadFile(_)) => ErrorKind::Io,
            Error::Config(_) => ErrorKind::ConfigInvalid,
            Error::Store(StoreError::NoPrivateKey(_)) => ErrorKind::NoAccess,
            Error::Store(StoreError::InvalidFormat(_)) => ErrorKind::ConfigInvalid,
            Error::Store(_) => ErrorKind::Io,
            Error::Cipher(CipherError::DecryptionFailed) => ErrorKind::DecryptionFailed,
            Error::Cipher(CipherError::AuthenticationFailed) => ErrorKind::AuthenticationFailed,
            Error::Cipher(CipherError::InvalidPublicKey(_)) => ErrorKind::ConfigInvalid,
            Error::Cipher(CipherError::EncryptionFailed) => ErrorKind::Io,
            Error::Access(AccessError::NoAccess(_)) => ErrorKind::NoAccess,
            Error::Access(AccessError::AlreadyExists(_)) => ErrorKind::AlreadyExists,
            Error::Access(AccessError::DeviceNotFound(_) | AccessError::UserNotFound(_)) => {
                ErrorKind::UserOrDeviceNotFound
            }
            Error::Access(AccessError::LastDeviceRevocation(_)) => ErrorKind::LastDeviceRevocation,
            Error::Access(AccessError::Declined(_)) => ErrorKind::Cancelled,
            Error::Access(AccessError::PermissionDenied(_)) => ErrorKind::PermissionDenied,
            Error::Resolve(ResolveError::InvalidPattern { .. }) => ErrorKind::InvalidPattern,
            Error::Resolve(ResolveError::FileNotFound(_)) => ErrorKind::FileNotFound,
            Error::Resolve(ResolveError::WrongFileType { .. }) => ErrorKind::WrongFileType,
            Error::Validation(ValidationError::ConflictingOptions(_)) => {
                ErrorKind::ConflictingOptions
            }
            Error::Validation(ValidationError::InvalidPermissions { .. }) => {
                ErrorKind::PermissionDenied
            }
            Error::Validation(ValidationError::InvalidName { .. }) => ErrorKind::ConfigInvalid,
            Error::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                ErrorKind::PermissionDenied
            }
            Error::Io(_) | Error::Json(_) => ErrorKind::Io,
            Error::File { source, .. } => source.kind(),
        }
    }

    /// Actionable hint for the CLI, if one applies.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::NotInitialized => Some("run: cellar init"),
            ErrorKind::NoAccess => Some("ask an active teammate to run: cellar register <device>"),
            ErrorKind::DecryptionFailed => {
                Some("your device key may have been rotated or revoked; run: cellar doctor")
            }
            ErrorKind::AuthenticationFailed => {
                Some("the file may be tampered with or stale; run: cellar doctor")
            }
            ErrorKind::AlreadyExists => Some("pass --force to overwrite"),
            ErrorKind::LastDeviceRevocation => {
                Some("register another device first, or pass --allow-lockout")
            }
            ErrorKind::PermissionDenied => Some("run: chmod 600 on the key file"),
            _ => None,
        }
    }
}

impl Error {
    /// Attach the file an error happened on.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
