//! Clipboard session management.
//!
//! The clipboard itself is an external command (default `wl-copy`) fed
//! on stdin. Copying a secret schedules its own erasure: a detached
//! timer thread overwrites the clipboard with an empty string after the
//! configured timeout. The clear is unconditional and the timer thread
//! keeps no copy of the secret.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::models::Secret;

/// Clipboard errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard command '{0}' failed")]
    CommandFailed(String),

    #[error("Clipboard command is empty")]
    EmptyCommand,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClipboardResult<T> = Result<T, ClipboardError>;

/// Anything that can receive clipboard text.
pub trait ClipboardSink: Send + Sync {
    fn set(&self, text: &[u8]) -> ClipboardResult<()>;
}

/// Sink spawning a configured command line and writing to its stdin.
pub struct CommandSink {
    argv: Vec<String>,
}

impl CommandSink {
    /// Build from a whitespace-separated command line, e.g. `wl-copy`
    /// or `xclip -selection clipboard`.
    pub fn new(command_line: &str) -> ClipboardResult<Self> {
        let argv: Vec<String> = command_line.split_whitespace().map(str::to_string).collect();
        if argv.is_empty() {
            return Err(ClipboardError::EmptyCommand);
        }
        Ok(Self { argv })
    }
}

impl ClipboardSink for CommandSink {
    fn set(&self, text: &[u8]) -> ClipboardResult<()> {
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()?;

        {
            let mut stdin = child.stdin.take().expect("stdin was piped");
            stdin.write_all(text)?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(ClipboardError::CommandFailed(self.argv[0].clone()));
        }
        Ok(())
    }
}

/// Handle on the pending clear; lets the caller keep the process alive
/// until the clear has fired.
pub struct ClearGuard(JoinHandle<()>);

impl ClearGuard {
    /// Block until the clipboard has been cleared.
    pub fn wait(self) {
        let _ = self.0.join();
    }
}

/// Push a secret to the clipboard, then schedule its erasure.
///
/// The copy itself is synchronous; the returned guard only tracks the
/// timer thread. `None` timeout disables clearing entirely.
pub fn copy(
    sink: Arc<dyn ClipboardSink>,
    secret: &Secret,
    timeout_secs: Option<u64>,
) -> ClipboardResult<Option<ClearGuard>> {
    sink.set(secret.expose())?;

    let Some(secs) = timeout_secs else {
        return Ok(None);
    };

    log::debug!("clipboard clears in {}s", secs);

    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_secs(secs));
        if let Err(e) = sink.set(b"") {
            log::warn!("clipboard clear failed: {}", e);
        }
    });

    Ok(Some(ClearGuard(handle)))
}
