//! Sealpass - A minimal local secret store sealed with age
//!
//! # Features
//! - **One file per secret**: each entry is a single age ciphertext
//! - **Categories as directories**: `work/vpn` lives at `work/vpn.age`
//! - **External encryption**: all cryptography delegated to the `age`
//!   tool, keyed to one passphrase-protected master identity
//! - **Ephemeral clipboard**: copied secrets clear themselves
//! - **Pattern-based generation**: random passwords from a configurable
//!   character class
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   CLI                       │
//! ├──────────┬──────────┬───────────┬───────────┤
//! │ Generate │ Clipboard│  Prompt   │   Keys    │
//! ├──────────┴──────────┴───────────┴───────────┤
//! │              Store (paths, entries)         │
//! ├─────────────────────────────────────────────┤
//! │        age / age-keygen subprocesses        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//! ```bash
//! # Create the master key (age prompts for a passphrase)
//! sealpass generate-master-key
//!
//! # Store a secret under a category
//! sealpass add work/vpn
//!
//! # Copy it, auto-clearing the clipboard after 15s
//! sealpass copy work/vpn
//! ```

#![warn(clippy::all)]

pub mod age;
pub mod cli;
pub mod clipboard;
pub mod generate;
pub mod keys;
pub mod models;
pub mod paths;
pub mod prompt;
pub mod store;

// Re-exports for convenience
pub use age::{AgeBackend, AgeCli};
pub use models::Secret;
pub use paths::SecretName;
pub use store::{Store, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store location
pub fn default_store_path() -> std::path::PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("sealpass")
}

/// Application configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store root directory (`SEALPASS_DIR`)
    pub store_dir: std::path::PathBuf,
    /// Generated password length (`SEALPASS_LENGTH`)
    pub password_length: usize,
    /// Generated password character pattern (`SEALPASS_PATTERN`)
    pub pattern: String,
    /// Clipboard command line (`SEALPASS_CLIP`)
    pub clip_command: String,
    /// Clipboard clear timeout in seconds; `None` disables clearing
    /// (`SEALPASS_CLIP_TIME`, `off` to disable)
    pub clip_timeout: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_path(),
            password_length: 12,
            pattern: "[:alnum:]_".to_string(),
            clip_command: "wl-copy".to_string(),
            clip_timeout: Some(15),
        }
    }
}

impl Config {
    /// Read the configuration surface from the environment, falling
    /// back to defaults for unset or unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let store_dir = std::env::var_os("SEALPASS_DIR")
            .map(std::path::PathBuf::from)
            .unwrap_or(defaults.store_dir);

        let password_length = std::env::var("SEALPASS_LENGTH")
            .ok()
            .and_then(|v| match v.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    log::debug!("ignoring unparseable SEALPASS_LENGTH={}", v);
                    None
                }
            })
            .unwrap_or(defaults.password_length);

        let pattern = std::env::var("SEALPASS_PATTERN").unwrap_or(defaults.pattern);

        let clip_command = std::env::var("SEALPASS_CLIP").unwrap_or(defaults.clip_command);

        let clip_timeout = match std::env::var("SEALPASS_CLIP_TIME") {
            Ok(v) if v.eq_ignore_ascii_case("off") => None,
            Ok(v) => match v.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    log::debug!("ignoring unparseable SEALPASS_CLIP_TIME={}", v);
                    defaults.clip_timeout
                }
            },
            Err(_) => defaults.clip_timeout,
        };

        Self {
            store_dir,
            password_length,
            pattern,
            clip_command,
            clip_timeout,
        }
    }
}

/// Error type for the library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Name validation errors
    #[error(transparent)]
    Path(#[from] paths::PathError),

    /// Repository errors
    #[error(transparent)]
    Store(#[from] store::StoreError),

    /// Master key errors
    #[error(transparent)]
    Key(#[from] keys::KeyError),

    /// Encryption primitive errors
    #[error(transparent)]
    Age(#[from] age::AgeError),

    /// Password generation errors
    #[error(transparent)]
    Generate(#[from] generate::GenerateError),

    /// Prompt errors
    #[error(transparent)]
    Prompt(#[from] prompt::PromptError),

    /// Clipboard errors
    #[error(transparent)]
    Clipboard(#[from] clipboard::ClipboardError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the library
pub type Result<T> = std::result::Result<T, Error>;
