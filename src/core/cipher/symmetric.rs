//! Project key and file encryption.
//!
//! Sealed format: `b"CLR1" || fingerprint (8) || nonce (24) || ciphertext || tag (16)`.
//! The 12-byte header is authenticated as associated data, so a ciphertext
//! opened under a different project key fails before any tag check.

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::trace;
use zeroize::Zeroizing;

use crate::error::{CipherError, Result};

/// Size of the project key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;
/// Size of the XChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 24;

const MAGIC: &[u8; 4] = b"CLR1";
const FINGERPRINT_SIZE: usize = 8;
const HEADER_SIZE: usize = MAGIC.len() + FINGERPRINT_SIZE;
const TAG_SIZE: usize = 16;

/// Short identifier of a project key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_SIZE]);

impl Fingerprint {
    /// Read the fingerprint from a sealed file header, if it has one.
    pub fn of_ciphertext(ciphertext: &[u8]) -> Option<Self> {
        if ciphertext.len() < HEADER_SIZE || &ciphertext[..MAGIC.len()] != MAGIC {
            return None;
        }
        let mut bytes = [0u8; FINGERPRINT_SIZE];
        bytes.copy_from_slice(&ciphertext[MAGIC.len()..HEADER_SIZE]);
        Some(Self(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// The project's symmetric key. Held only in memory; zeroed on drop.
#[derive(Clone)]
pub struct ProjectKey(Zeroizing<[u8; KEY_SIZE]>);

impl ProjectKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
        rand::thread_rng().fill_bytes(&mut bytes[..]);
        Self(bytes)
    }

    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` if the slice is not exactly
    /// `KEY_SIZE` bytes; a wrapped key that unwraps to anything else is corrupt.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        if data.len() != KEY_SIZE {
            return Err(CipherError::DecryptionFailed.into());
        }
        let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
        bytes.copy_from_slice(data);
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// First 8 bytes of the SHA-256 of the key.
    pub fn fingerprint(&self) -> Fingerprint {
        let digest = Sha256::digest(&self.0[..]);
        let mut bytes = [0u8; FINGERPRINT_SIZE];
        bytes.copy_from_slice(&digest[..FINGERPRINT_SIZE]);
        Fingerprint(bytes)
    }

    fn header(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[..MAGIC.len()].copy_from_slice(MAGIC);
        header[MAGIC.len()..].copy_from_slice(&self.fingerprint().0);
        header
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.0[..]))
    }

    /// Seal plaintext under this key with a fresh random nonce.
    ///
    /// Output differs on every call for the same input.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let header = self.header();
        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .cipher()
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &header,
                },
            )
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + sealed.len());
        out.extend_from_slice(&header);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);

        trace!(
            plaintext_len = plaintext.len(),
            ciphertext_len = out.len(),
            "sealed"
        );
        Ok(out)
    }

    /// Open a sealed file.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::AuthenticationFailed` if the input is truncated,
    /// carries another key's fingerprint, or the tag does not verify.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if ciphertext.len() < HEADER_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::AuthenticationFailed.into());
        }
        match Fingerprint::of_ciphertext(ciphertext) {
            Some(fp) if fp == self.fingerprint() => {}
            _ => return Err(CipherError::AuthenticationFailed.into()),
        }

        let (header, rest) = ciphertext.split_at(HEADER_SIZE);
        let (nonce, sealed) = rest.split_at(NONCE_SIZE);

        let plaintext = self
            .cipher()
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: header,
                },
            )
            .map_err(|_| CipherError::AuthenticationFailed)?;

        trace!(plaintext_len = plaintext.len(), "opened");
        Ok(Zeroizing::new(plaintext))
    }
}

impl fmt::Debug for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
