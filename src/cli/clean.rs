//! Clean command - remove orphaned wrapped keys.

use crate::cli::output;
use crate::core::context::Context;
use crate::core::vault::Vault;
use crate::error::Result;

/// Delete wrapped keys whose public key is gone.
pub fn execute(ctx: &Context, force: bool) -> Result<()> {
    let vault = Vault::open(ctx)?;
    let removed = vault.clean(force)?;

    if removed.is_empty() {
        output::success("no orphaned wrapped keys");
        return Ok(());
    }
    for device in &removed {
        output::list_item(&format!("removed {}", output::device(device)));
    }
    output::success(&format!("removed {} orphaned wrapped key(s)", removed.len()));
    Ok(())
}
