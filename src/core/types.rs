//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A stable device identifier; names the device's store artifacts.
pub type DeviceId = String;

/// A project identifier (UUID string).
pub type ProjectId = String;

/// An age public key string (starts with "age1...").
pub type PublicKey = String;

/// A user's email address.
pub type Email = String;
