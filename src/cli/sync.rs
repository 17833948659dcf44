//! Sync command - re-key the project.

use crate::cli::output;
use crate::core::context::Context;
use crate::core::domain::SyncResult;
use crate::core::vault::Vault;
use crate::error::Result;

/// Generate a new project key and re-encrypt every secret under it.
pub fn execute(ctx: &Context) -> Result<()> {
    let mut vault = Vault::open(ctx)?;
    let identity = vault.identity()?;
    let result = vault.sync(&identity, &[])?;

    output::success("project re-keyed");
    print_result(&result);
    Ok(())
}

pub(crate) fn print_result(result: &SyncResult) {
    output::kv("key", &result.fingerprint);
    output::kv("devices", result.devices.len());
    output::kv("files", result.files.len());
}
