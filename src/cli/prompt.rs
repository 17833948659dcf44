//! Interactive confirmation.

use std::io::{self, IsTerminal};

use crate::core::confirm::Prompt;
use crate::error::Result;

/// Asks on the terminal; declines when stdin is not a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal;

impl Prompt for Terminal {
    fn confirm(&self, question: &str) -> Result<bool> {
        if !io::stdin().is_terminal() {
            return Ok(false);
        }
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()).into())
    }
}
