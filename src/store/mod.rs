//! The secret repository.
//!
//! Maps secret names onto encrypted files under the store root:
//! `<category>/.../<name>.age`, with the master key at the root.
//! Category directories appear when the first entry needs them and
//! disappear when the last entry in them is deleted.
//!
//! Everything written here is owner-only. There is no cross-process
//! locking; two invocations racing on the same entry is an accepted
//! limitation of the design.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::age::{AgeBackend, AgeError};
use crate::keys::{KeyError, MasterKey};
use crate::models::Secret;
use crate::paths::SecretName;
use crate::prompt::Prompter;

/// Extension of every encrypted entry file.
pub const SECRET_EXT: &str = "age";

/// Repository errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No master key in the store; run generate-master-key first")]
    MissingMasterKey,

    #[error("Secret '{0}' already exists")]
    AlreadyExists(String),

    #[error("Secret '{0}' not found")]
    NotFound(String),

    #[error("Could not create category '{0}'")]
    CategoryCreationFailed(String),

    #[error("Could not access store directory '{0}'")]
    DirectoryAccessFailed(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Age(#[from] AgeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A secret store rooted at one directory.
pub struct Store {
    root: PathBuf,
    backend: Box<dyn AgeBackend>,
}

impl Store {
    /// Open the store, creating the root directory (owner-only) on
    /// first use.
    pub fn open(root: impl Into<PathBuf>, backend: Box<dyn AgeBackend>) -> StoreResult<Self> {
        let root = root.into();

        if !root.is_dir() {
            create_dir_secure(&root)
                .map_err(|_| StoreError::DirectoryAccessFailed(root.display().to_string()))?;
            log::info!("created store at {}", root.display());
        }

        Ok(Self { root, backend })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self) -> &dyn AgeBackend {
        self.backend.as_ref()
    }

    pub fn master_key(&self) -> MasterKey {
        MasterKey::in_store(&self.root)
    }

    /// Create the store's master key pair.
    pub fn generate_master_key(&self) -> StoreResult<()> {
        self.master_key().generate(self.backend.as_ref())?;
        Ok(())
    }

    fn require_master_key(&self) -> StoreResult<MasterKey> {
        let key = self.master_key();
        if !key.exists() {
            return Err(StoreError::MissingMasterKey);
        }
        Ok(key)
    }

    fn entry_path(&self, name: &SecretName) -> PathBuf {
        self.root.join(format!("{}.{}", name.as_str(), SECRET_EXT))
    }

    pub fn contains(&self, name: &SecretName) -> bool {
        self.entry_path(name).is_file()
    }

    /// Encrypt and store a new secret. Fails if the name is taken;
    /// the entry file only appears once the primitive has produced the
    /// full ciphertext.
    pub fn add(&self, name: &SecretName, secret: &Secret) -> StoreResult<()> {
        let key = self.require_master_key()?;

        if self.contains(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let category = name.category();
        if !category.is_empty() {
            create_dir_secure(&self.root.join(category))
                .map_err(|_| StoreError::CategoryCreationFailed(category.to_string()))?;
        }

        let recipient = key.recipient(self.backend.as_ref())?;
        let ciphertext = self.backend.encrypt(secret, &recipient)?;
        write_secure(&self.entry_path(name), &ciphertext)?;

        log::debug!("stored {}", name);
        Ok(())
    }

    /// Decrypt a stored secret. A decryption failure here means a
    /// wrong passphrase or a corrupted entry and must abort the whole
    /// process, not just this operation.
    pub fn read(&self, name: &SecretName) -> StoreResult<Secret> {
        let key = self.require_master_key()?;

        let path = self.entry_path(name);
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let ciphertext = fs::read(&path)?;
        Ok(self.backend.decrypt(key.path(), &ciphertext)?)
    }

    /// Remove a secret after interactive confirmation, pruning emptied
    /// category directories on the way up.
    ///
    /// Silently does nothing when the name resolves to the master key
    /// file, when confirmation is declined, or when the entry does not
    /// exist.
    pub fn delete(&self, name: &SecretName, prompter: &dyn Prompter) -> StoreResult<()> {
        self.require_master_key()?;

        let path = self.entry_path(name);
        if path == self.master_key().path() {
            log::warn!("refusing to delete the master key");
            return Ok(());
        }

        let confirmed = prompter
            .confirm(&format!("Delete secret '{}'?", name))
            .unwrap_or(false);
        if !confirmed {
            return Ok(());
        }

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        self.prune_categories(&path);
        Ok(())
    }

    /// Remove now-empty ancestor directories, walking upward and
    /// stopping at the store root. A non-empty directory ends the walk;
    /// its error is not surfaced.
    fn prune_categories(&self, entry: &Path) {
        let mut dir = entry.parent();
        while let Some(d) = dir {
            if d == self.root {
                break;
            }
            if fs::remove_dir(d).is_err() {
                break;
            }
            log::debug!("pruned empty category {}", d.display());
            dir = d.parent();
        }
    }

    /// All stored secret names, in filesystem traversal order. The
    /// iterator is lazy; call again to restart.
    pub fn list(&self) -> StoreResult<impl Iterator<Item = String> + '_> {
        self.require_master_key()?;

        let key_path = self.master_key().path().to_path_buf();
        let root = self.root.clone();

        Ok(WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(move |entry| {
                entry.file_type().is_file()
                    && entry.path() != key_path
                    && entry.path().extension().is_some_and(|e| e == SECRET_EXT)
            })
            .filter_map(move |entry| {
                let rel = entry.path().strip_prefix(&root).ok()?.with_extension("");
                Some(
                    rel.components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/"),
                )
            }))
    }
}

/// Write a file with owner-only permissions, atomically: the bytes land
/// in a temporary sibling first and are renamed over the final path, so
/// a failure leaves no partial file behind.
pub(crate) fn write_secure(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");

    let write_result = (|| {
        fs::write(&tmp, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, path)
    })();

    if write_result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    write_result
}

/// Create a directory chain with owner-only permissions.
pub(crate) fn create_dir_secure(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder.create(path)
}
