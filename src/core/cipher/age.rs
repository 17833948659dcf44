//! Age key wrapping backend.
//!
//! Wraps the 32-byte project key in an ASCII-armored age envelope for one
//! x25519 recipient.

use std::io::{Read, Write};

use ::age::x25519;
use tracing::trace;
use zeroize::Zeroizing;

use super::{KeyWrap, ProjectKey};
use crate::error::{CipherError, Result};

/// The project key wrapped for one device (armored age ciphertext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey(String);

impl WrappedKey {
    /// Armored text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WrappedKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Age-based key wrapping using x25519 keys
pub struct Age;

impl KeyWrap for Age {
    type Recipient = x25519::Recipient;
    type Identity = x25519::Identity;

    fn name(&self) -> &'static str {
        "age"
    }

    fn wrap(&self, key: &ProjectKey, recipient: &x25519::Recipient) -> Result<WrappedKey> {
        trace!(fingerprint = %key.fingerprint(), "wrapping project key");

        let encryptor =
            age::Encryptor::with_recipients(std::iter::once(recipient as &dyn age::Recipient))
                .map_err(|_| CipherError::EncryptionFailed)?;

        let mut wrapped = Vec::new();
        let armor = age::armor::ArmoredWriter::wrap_output(
            &mut wrapped,
            age::armor::Format::AsciiArmor,
        )
        .map_err(|_| CipherError::EncryptionFailed)?;
        let mut writer = encryptor
            .wrap_output(armor)
            .map_err(|_| CipherError::EncryptionFailed)?;

        writer
            .write_all(key.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;
        let armor = writer.finish().map_err(|_| CipherError::EncryptionFailed)?;
        armor.finish().map_err(|_| CipherError::EncryptionFailed)?;

        let text = String::from_utf8(wrapped).map_err(|_| CipherError::EncryptionFailed)?;
        Ok(WrappedKey(text))
    }

    fn unwrap(&self, wrapped: &WrappedKey, identity: &x25519::Identity) -> Result<ProjectKey> {
        trace!(len = wrapped.0.len(), "unwrapping project key");

        let reader = age::armor::ArmoredReader::new(wrapped.0.as_bytes());
        let decryptor =
            age::Decryptor::new(reader).map_err(|_| CipherError::DecryptionFailed)?;

        let mut reader = decryptor
            .decrypt(std::iter::once(identity as &dyn age::Identity))
            .map_err(|_| CipherError::DecryptionFailed)?;

        let mut bytes = Zeroizing::new(Vec::new());
        reader
            .read_to_end(&mut bytes)
            .map_err(|_| CipherError::DecryptionFailed)?;

        ProjectKey::from_slice(&bytes)
    }
}

/// Parse a public key string into an age recipient
///
/// # Errors
///
/// Returns `CipherError::InvalidPublicKey` if the key format is invalid.
pub fn parse_recipient(key: &str) -> Result<x25519::Recipient> {
    key.trim()
        .parse::<x25519::Recipient>()
        .map_err(|_| CipherError::InvalidPublicKey(key.trim().to_string()).into())
}
