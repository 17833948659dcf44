//! Create command - generate this machine's device keypair.

use crate::cli::output;
use crate::core::constants;
use crate::core::context::Context;
use crate::core::vault::Vault;
use crate::error::Result;

/// Create a keypair for this machine and commit its public half.
pub fn execute(ctx: &Context, name: Option<&str>, force: bool) -> Result<()> {
    let mut vault = Vault::open(ctx)?;
    let identity = vault.create(name, force)?;
    let device = identity.device_id();

    output::success(&format!("created device {}", output::device(device)));
    output::kv("public key", identity.public_key());
    output::kv(
        "private",
        ctx.store().key_path(vault.project_id()).display(),
    );
    println!();

    if vault.layout().list_wrapped_keys()?.is_empty() {
        output::hint(&format!(
            "nobody has access yet; bootstrap the project key with: cellar register {device}"
        ));
    } else {
        output::hint(&format!(
            "commit {} and ask a teammate with access to run: cellar register {device}",
            constants::STORE_DIR
        ));
    }
    Ok(())
}
