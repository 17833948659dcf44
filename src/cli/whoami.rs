//! Whoami command - print your identity and this machine's device.

use crate::cli::output;
use crate::core::context::Context;
use crate::core::vault::Vault;
use crate::error::{ErrorKind, Result};

/// Print the user and, inside a project, the device and its public key.
pub fn execute(ctx: &Context) -> Result<()> {
    output::kv("name", &ctx.user.name);
    output::kv("email", &ctx.user.email);

    let vault = match Vault::open(ctx) {
        Ok(vault) => vault,
        Err(e) if e.kind() == ErrorKind::NotInitialized => return Ok(()),
        Err(e) => return Err(e),
    };

    let project = vault.project_id();
    if !ctx.store().has_key(project) {
        output::kv("device", "none");
        output::hint("run: cellar create");
        return Ok(());
    }

    let identity = vault.identity()?;
    let device = identity.device_id();
    output::kv("device", output::device(device));
    output::kv("status", vault.status(device));
    output::kv("public key", identity.public_key());
    Ok(())
}
