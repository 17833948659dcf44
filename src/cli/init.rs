//! Init command - create the store in the current directory.

use tracing::info;

use crate::cli::output;
use crate::core::constants;
use crate::core::context::Context;
use crate::core::vault::Vault;
use crate::error::Result;

/// Initialize cellar in the project root.
pub fn execute(ctx: &Context, name: Option<&str>) -> Result<()> {
    let vault = Vault::init(ctx, name)?;
    let project = &vault.registry().project;
    info!(project = %project.id, "initialized");

    output::success(&format!("initialized {}", output::path(constants::STORE_DIR)));
    output::kv("project", &project.name);
    output::kv("id", &project.id);
    println!();
    output::hint("next: cellar create");
    Ok(())
}
