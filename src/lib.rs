//! Cellar - git-native team secrets with per-device keys.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! └── core/             # Core library components
//!     ├── cipher/       # age key wrapping, XChaCha20-Poly1305 file sealing
//!     ├── resolve       # paths, directories and globs to file sets
//!     ├── layout        # store artifacts and staged changesets
//!     ├── registry      # .cellar/project.toml
//!     ├── store/        # local device keys (~/.cellar/keys)
//!     ├── vault/        # create, register, rotate, sync, revoke, encrypt, doctor
//!     ├── context       # per-invocation settings
//!     ├── confirm       # confirmation gate
//!     └── audit         # audit event sink
//! ```
//!
//! # Model
//!
//! Each project has one symmetric project key. Every device that has access
//! holds a copy of it wrapped to its own age public key. Granting access
//! wraps the key for a new device; revoking access re-keys the project and
//! re-encrypts every secret file.

pub mod cli;
pub mod core;
pub mod error;
