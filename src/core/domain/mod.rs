//! Domain types.

mod check;
mod device;
pub mod identity;
mod report;
mod secret;
mod sync;
mod user;

pub use check::{Check, Report, Severity};
pub use device::{Device, DeviceStatus};
pub use identity::Identity;
pub use report::{BatchReport, FileFailure};
pub use secret::SecretFile;
pub use sync::SyncResult;
pub use user::User;
