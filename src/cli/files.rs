//! Encrypt and decrypt commands.

use std::path::Path;

use crate::cli::output;
use crate::core::context::Context;
use crate::core::domain::BatchReport;
use crate::core::vault::Vault;
use crate::error::Result;

/// Encrypt plaintext files; exits 1 if any file failed.
pub fn encrypt(ctx: &Context, patterns: &[String]) -> Result<i32> {
    let mut vault = Vault::open(ctx)?;
    let identity = vault.identity()?;
    let report = vault.encrypt(&identity, patterns)?;
    Ok(print_report(&vault, "encrypted", &report))
}

/// Decrypt ciphertexts; exits 1 if any file failed.
pub fn decrypt(ctx: &Context, patterns: &[String]) -> Result<i32> {
    let vault = Vault::open(ctx)?;
    let identity = vault.identity()?;
    let report = vault.decrypt(&identity, patterns)?;
    Ok(print_report(&vault, "decrypted", &report))
}

fn print_report(vault: &Vault<'_>, verb: &str, report: &BatchReport) -> i32 {
    let rel = |p: &Path| vault.layout().relative(p);

    if report.total() == 0 {
        output::dimmed("no matching files");
        return 0;
    }

    for path in &report.succeeded {
        output::list_item(&format!("{verb} {}", output::path(rel(path.as_path()))));
    }
    for path in &report.unchanged {
        output::dimmed(&format!("  • unchanged {}", rel(path.as_path())));
    }
    for failure in &report.failed {
        output::error(&format!("{}: {}", rel(failure.path.as_path()), failure.reason));
    }

    if report.is_success() {
        output::success(&format!(
            "{verb} {} file(s), {} unchanged",
            report.succeeded.len(),
            report.unchanged.len()
        ));
        0
    } else {
        output::warn(&format!(
            "{verb} {} file(s), {} failed",
            report.succeeded.len(),
            report.failed.len()
        ));
        1
    }
}
