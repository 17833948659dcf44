//! Revoke command - remove access and re-key.

use crate::cli::{output, sync, RevokeArgs};
use crate::core::context::Context;
use crate::core::vault::{RevokeOptions, Vault};
use crate::error::{Result, ValidationError};

/// Revoke a device, or a user's devices.
pub fn execute(ctx: &Context, args: &RevokeArgs) -> Result<()> {
    let opts = RevokeOptions {
        force: args.force,
        allow_lockout: args.allow_lockout,
    };

    let mut vault = Vault::open(ctx)?;
    let identity = vault.identity()?;
    let result = match (&args.device, &args.user) {
        (Some(device), None) => vault.revoke(&identity, device, opts)?,
        (None, Some(email)) => {
            vault.revoke_user(&identity, email, args.user_device.as_deref(), opts)?
        }
        _ => {
            return Err(ValidationError::ConflictingOptions(
                "pass exactly one of <DEVICE> or --user".to_string(),
            )
            .into())
        }
    };

    for device in &result.revoked {
        output::success(&format!("revoked {}", output::device(device)));
    }
    if result.devices.is_empty() {
        output::warn("no device holds the project key any more");
    } else {
        sync::print_result(&result);
    }
    println!();
    output::warn("revoked devices may still hold decrypted copies");
    output::hint("rotate the secret values themselves if exfiltration is suspected");
    Ok(())
}
