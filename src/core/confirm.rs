//! Confirmation gate.
//!
//! Register, revoke, rotate and clean all ask before doing something that
//! overwrites or destroys state. `--force` and dry runs skip the question.

use crate::core::context::Context;
use crate::error::{Error, Result};

/// Asks the user a yes/no question.
pub trait Prompt {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Declines every question. Used when there is no terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deny;

impl Prompt for Deny {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Accepts every question.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accept;

impl Prompt for Accept {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Whether to proceed.
pub fn confirm(ctx: &Context, force: bool, question: &str) -> Result<bool> {
    if force || ctx.dry_run {
        return Ok(true);
    }
    ctx.prompt().confirm(question)
}

/// Proceed or fail with the error built by `declined`.
pub fn require(
    ctx: &Context,
    force: bool,
    question: &str,
    declined: impl FnOnce() -> Error,
) -> Result<()> {
    if confirm(ctx, force, question)? {
        Ok(())
    } else {
        Err(declined())
    }
}
