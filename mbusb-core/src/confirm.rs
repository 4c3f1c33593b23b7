//! Confirmation of destructive actions

use crate::error::{PromptSnafu, UsbError};
use snafu::ResultExt;
use std::io::{self, BufRead, Write};

/// Decides whether a destructive action may proceed.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool, UsbError>;
}

/// Only "yes" or "y" (any case, surrounding whitespace ignored) counts.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Asks on the terminal and reads one line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleConfirm;

impl Confirm for ConsoleConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, UsbError> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt} (yes/no): ").context(PromptSnafu)?;
        stdout.flush().context(PromptSnafu)?;

        // EOF leaves the answer empty, which declines
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context(PromptSnafu)?;

        Ok(is_affirmative(&answer))
    }
}

/// Answers yes without asking (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool, UsbError> {
        Ok(true)
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> Result<bool, UsbError> {
        Ok(self(prompt))
    }
}
