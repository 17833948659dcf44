//! Doctor command - store consistency and local key health.

use console::style;

use crate::cli::output;
use crate::core::context::Context;
use crate::core::domain::{Report, Severity};
use crate::core::vault::Vault;
use crate::error::Result;

/// Run every check; the exit code reflects the worst result.
pub fn execute(ctx: &Context, json: bool) -> Result<i32> {
    let report = Vault::doctor(ctx);
    if json {
        output::json(&report)?;
    } else {
        print(&report);
    }
    Ok(report.exit_code())
}

fn print(report: &Report) {
    output::header("cellar doctor");
    output::rule();
    for check in &report.checks {
        let mark = match check.severity {
            Severity::Pass => style("✓").green(),
            Severity::Warning => style("⚠").yellow(),
            Severity::Error => style("✗").red(),
        };
        println!("{} {:<14} {}", mark, check.name, check.message);
        if let Some(hint) = &check.hint {
            output::dimmed(&format!("  → {hint}"));
        }
    }
    output::rule();
    println!(
        "{} passed, {} warning(s), {} error(s)",
        report.count(Severity::Pass),
        report.count(Severity::Warning),
        report.count(Severity::Error)
    );
}
