//! Rotate command - replace this machine's keypair.

use crate::cli::output;
use crate::core::context::Context;
use crate::core::vault::Vault;
use crate::error::Result;

/// Rotate the invoking device's key.
pub fn execute(ctx: &Context, force: bool) -> Result<()> {
    let mut vault = Vault::open(ctx)?;
    let current = vault.identity()?;
    let replacement = vault.rotate(&current, force)?;

    output::success(&format!(
        "rotated key for {}",
        output::device(replacement.device_id())
    ));
    output::kv("public key", replacement.public_key());
    output::dimmed("  the previous private key was archived");
    Ok(())
}
