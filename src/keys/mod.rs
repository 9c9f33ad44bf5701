//! Master key lifecycle.
//!
//! One passphrase-protected age identity per store, written once and
//! never rewritten. Every secret in the store is encrypted to this
//! key's recipient.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::age::{AgeBackend, AgeError};
use crate::store::write_secure;

/// Filename of the master key at the store root.
pub const IDENTITY_FILE: &str = "identity.age";

/// Key manager errors
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Master key already exists")]
    AlreadyExists,

    #[error("Primitive error: {0}")]
    Age(#[from] AgeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type KeyResult<T> = Result<T, KeyError>;

/// Handle on the store's master key file.
pub struct MasterKey {
    path: PathBuf,
}

impl MasterKey {
    pub fn in_store(root: &Path) -> Self {
        Self {
            path: root.join(IDENTITY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create the master key. Fails if one is already present; the
    /// primitive prompts for the protecting passphrase. Either the
    /// complete key file lands on disk or nothing does.
    pub fn generate(&self, backend: &dyn AgeBackend) -> KeyResult<()> {
        if self.exists() {
            return Err(KeyError::AlreadyExists);
        }

        let identity = backend.generate_identity()?;
        write_secure(&self.path, &identity)?;

        log::info!("master key written to {}", self.path.display());
        Ok(())
    }

    /// Derive the public recipient from the key file. The primitive
    /// prompts for the passphrase; a failed decryption propagates and
    /// is fatal to the caller.
    pub fn recipient(&self, backend: &dyn AgeBackend) -> KeyResult<String> {
        Ok(backend.recipient_of(&self.path)?)
    }
}
