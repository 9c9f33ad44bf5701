//! Interactive confirmation and secure input.
//!
//! Both prompts go through dialoguer, which owns the terminal-mode
//! dance: raw/no-echo mode is scoped to the single interaction and
//! restored on every exit path, including interrupts. Behind the
//! [`Prompter`] trait so non-interactive tests can script the answers.

use std::io;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Password};
use thiserror::Error;

use crate::models::Secret;

/// Prompt errors
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Entries did not match")]
    Mismatch,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type PromptResult<T> = Result<T, PromptError>;

/// Terminal interaction needed by the store operations.
pub trait Prompter {
    /// Ask a yes/no question; a single `y`/`Y` keypress affirms.
    fn confirm(&self, prompt: &str) -> io::Result<bool>;

    /// Read one line of input with echo disabled.
    fn read_secret(&self, prompt: &str) -> io::Result<Secret>;
}

/// Prompt twice with no echo and require both entries to be identical.
pub fn read_secret_confirmed(prompter: &dyn Prompter, prompt: &str) -> PromptResult<Secret> {
    let first = prompter.read_secret(prompt)?;
    let second = prompter.read_secret("Confirm")?;

    if first != second {
        return Err(PromptError::Mismatch);
    }

    Ok(first)
}

/// [`Prompter`] talking to the controlling terminal.
pub struct TermPrompter;

impl Prompter for TermPrompter {
    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }

    fn read_secret(&self, prompt: &str) -> io::Result<Secret> {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map(Secret::from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}
