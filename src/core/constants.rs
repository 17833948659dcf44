//! Constants used throughout cellar.
//!
//! Centralizes magic strings and layout names.

/// Store directory at the project root.
pub const STORE_DIR: &str = ".cellar";

/// Public keys directory inside the store.
pub const PUBLIC_KEYS_DIR: &str = "public_keys";

/// Wrapped project keys directory inside the store.
pub const WRAPPED_KEYS_DIR: &str = "secrets";

/// Registry file inside the store.
pub const REGISTRY_FILE: &str = "project.toml";

/// Audit log inside the store.
pub const AUDIT_LOG: &str = "audit.log";

/// Suffix appended to a plaintext path to name its ciphertext sibling.
pub const CIPHER_SUFFIX: &str = ".enc";

/// Local cellar directory relative to HOME (`~/.cellar`).
pub const HOME_DIR: &str = ".cellar";

/// Per-project key directory inside the local cellar directory.
pub const KEYS_DIR: &str = "keys";

/// User configuration file inside the local cellar directory.
pub const USER_CONFIG_FILE: &str = "config.toml";

/// Private key file name.
pub const IDENTITY_FILE: &str = "identity.key";

/// Local device record file name.
pub const DEVICE_FILE: &str = "device.toml";

/// Directory for superseded private keys.
pub const ARCHIVE_DIR: &str = "archive";

/// Version-control metadata directory, never walked.
pub const VCS_DIR: &str = ".git";

/// Ignore file maintained for plaintext secrets.
pub const GITIGNORE: &str = ".gitignore";

/// Required mode for private key files.
pub const PRIVATE_KEY_MODE: u32 = 0o600;
