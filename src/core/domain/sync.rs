use std::path::PathBuf;

use serde::Serialize;

use crate::core::types::DeviceId;

/// Result of a sync operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Ciphertexts re-encrypted under the new key
    pub files: Vec<PathBuf>,
    /// Devices the new key was wrapped for
    pub devices: Vec<DeviceId>,
    /// Fingerprint of the new project key
    pub fingerprint: String,
    /// Devices whose artifacts were removed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub revoked: Vec<DeviceId>,
}
