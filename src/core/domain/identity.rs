//! Identity type.
//!
//! A device's age private key, bound to the device id it was issued for.

use age::secrecy::ExposeSecret;
use age::x25519;
use zeroize::Zeroizing;

use crate::core::types::{DeviceId, PublicKey};
use crate::error::{Result, StoreError};

/// A private key identity for unwrapping the project key
pub struct Identity {
    device: DeviceId,
    inner: x25519::Identity,
}

impl Identity {
    /// Generate a fresh keypair for a device.
    pub fn generate(device: impl Into<DeviceId>) -> Self {
        Self {
            device: device.into(),
            inner: crate::core::cipher::generate_keypair(),
        }
    }

    /// Parse an `AGE-SECRET-KEY-...` string.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidFormat` naming `origin` if the key is malformed.
    pub fn parse(
        device: impl Into<DeviceId>,
        text: &str,
        origin: &std::path::Path,
    ) -> Result<Self> {
        let inner: x25519::Identity = text
            .trim()
            .parse()
            .map_err(|_: &str| StoreError::InvalidFormat(origin.to_path_buf()))?;
        Ok(Self {
            device: device.into(),
            inner,
        })
    }

    /// Device this key belongs to
    pub fn device_id(&self) -> &str {
        &self.device
    }

    /// Corresponding public key
    pub fn public_key(&self) -> PublicKey {
        self.inner.to_public().to_string()
    }

    /// Recipient for wrapping to this identity
    pub fn recipient(&self) -> x25519::Recipient {
        self.inner.to_public()
    }

    /// Reference to the inner age identity for unwrapping
    pub fn as_age(&self) -> &x25519::Identity {
        &self.inner
    }

    /// Serialized private key, newline-terminated.
    pub fn to_secret_string(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("{}\n", self.inner.to_string().expose_secret()))
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("device", &self.device)
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
