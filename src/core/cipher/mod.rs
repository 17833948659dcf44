//! Cryptographic primitives.
//!
//! Two layers:
//!
//! - **Key wrapping** (asymmetric): the project key is wrapped for each
//!   device's age x25519 public key. See [`KeyWrap`] and the [`Age`] backend.
//! - **File encryption** (symmetric): every secret file is sealed with the
//!   project key using XChaCha20-Poly1305. See [`ProjectKey`].

use ::age::x25519;

use crate::error::Result;

mod age;
mod symmetric;

pub use age::{parse_recipient, Age, WrappedKey};
pub use symmetric::{Fingerprint, ProjectKey, KEY_SIZE, NONCE_SIZE};

/// Asymmetric envelope for the project key.
///
/// Recipients and identities are backend-specific; for age they are x25519
/// public and private keys.
pub trait KeyWrap {
    /// Type representing a recipient public key.
    type Recipient;

    /// Type representing a private identity/key.
    type Identity;

    /// Wrap the project key for a single recipient.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::EncryptionFailed` if the envelope cannot be built.
    fn wrap(&self, key: &ProjectKey, recipient: &Self::Recipient) -> Result<WrappedKey>;

    /// Recover the project key from a wrapped key.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` on a wrong identity or corrupt
    /// input. Never panics.
    fn unwrap(&self, wrapped: &WrappedKey, identity: &Self::Identity) -> Result<ProjectKey>;

    /// Backend name for display.
    fn name(&self) -> &'static str;
}

/// Generate a fresh device keypair.
pub fn generate_keypair() -> x25519::Identity {
    x25519::Identity::generate()
}

/// Wrap the project key for an age recipient.
pub fn wrap(key: &ProjectKey, recipient: &x25519::Recipient) -> Result<WrappedKey> {
    Age.wrap(key, recipient)
}

/// Unwrap the project key with an age identity.
pub fn unwrap(wrapped: &WrappedKey, identity: &x25519::Identity) -> Result<ProjectKey> {
    Age.unwrap(wrapped, identity)
}
