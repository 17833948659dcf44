//! Device type and derived access status.

use serde::Serialize;

use crate::core::registry::Member;
use crate::core::types::DeviceId;

/// Access status, derived from which artifacts exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Public key and wrapped key present.
    Active,
    /// Public key only; waiting for a teammate to register it.
    Pending,
    /// Wrapped key without a public key.
    Orphan,
    /// Neither artifact.
    Absent,
}

impl DeviceStatus {
    pub fn derive(has_public: bool, has_wrapped: bool) -> Self {
        match (has_public, has_wrapped) {
            (true, true) => DeviceStatus::Active,
            (true, false) => DeviceStatus::Pending,
            (false, true) => DeviceStatus::Orphan,
            (false, false) => DeviceStatus::Absent,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Pending => "pending",
            DeviceStatus::Orphan => "orphan",
            DeviceStatus::Absent => "absent",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A device known to the store, either by artifact or by registry entry.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub status: DeviceStatus,
    /// Registry entry, if the device is registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Device {
    pub fn new(id: DeviceId, status: DeviceStatus, member: Option<&Member>) -> Self {
        Self {
            id,
            status,
            email: member
                .map(|m| m.email.clone())
                .filter(|e| !e.is_empty()),
            name: member.map(|m| m.name.clone()),
        }
    }
}
