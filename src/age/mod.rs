//! The external encryption primitive.
//!
//! All cryptography is delegated to the `age` and `age-keygen` binaries;
//! this module only moves bytes in and out of them. Passphrase prompts
//! happen inside age itself (it talks to the controlling tty), so
//! nothing here ever sees a passphrase.
//!
//! The operations are behind the [`AgeBackend`] trait so tests can
//! substitute an in-memory double for the real subprocess calls.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use thiserror::Error;

use crate::models::Secret;

const AGE_BIN: &str = "age";
const KEYGEN_BIN: &str = "age-keygen";

/// Primitive errors
#[derive(Debug, Error)]
pub enum AgeError {
    #[error("'{0}' not found in PATH")]
    PrimitiveNotFound(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Key generation failed: {0}")]
    KeygenFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AgeResult<T> = Result<T, AgeError>;

/// The asymmetric encryption service backing the store.
pub trait AgeBackend {
    /// Verify the tool is present and invokable.
    fn ensure_available(&self) -> AgeResult<()>;

    /// Produce a fresh identity, passphrase-protected by the tool
    /// (which prompts on its own tty). The returned bytes are the
    /// encrypted identity, ready to be written to disk.
    fn generate_identity(&self) -> AgeResult<Vec<u8>>;

    /// Decrypt the identity file (prompting for its passphrase) and
    /// derive the public recipient string from it.
    fn recipient_of(&self, identity: &Path) -> AgeResult<String>;

    /// Encrypt plaintext to a recipient.
    fn encrypt(&self, plaintext: &Secret, recipient: &str) -> AgeResult<Vec<u8>>;

    /// Decrypt ciphertext with the identity file (prompting for its
    /// passphrase).
    fn decrypt(&self, identity: &Path, ciphertext: &[u8]) -> AgeResult<Secret>;
}

/// [`AgeBackend`] implementation driving the age CLI.
pub struct AgeCli;

impl AgeCli {
    /// Spawn a command, optionally feeding `input` to its stdin, and
    /// collect stdout. Stderr stays on the terminal so age's own
    /// passphrase prompts and diagnostics reach the user.
    fn run(program: &str, args: &[&str], input: Option<&[u8]>) -> AgeResult<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        log::debug!("running {} {}", program, args.join(" "));

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AgeError::PrimitiveNotFound(program.to_string())
            } else {
                AgeError::Io(e)
            }
        })?;

        if let Some(bytes) = input {
            // Dropping the handle closes the pipe so the child sees EOF.
            let mut stdin = child.stdin.take().expect("stdin was piped");
            stdin.write_all(bytes)?;
        }

        Ok(child.wait_with_output()?)
    }

    fn check_binary(program: &str) -> AgeResult<()> {
        match Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AgeError::PrimitiveNotFound(program.to_string()))
            }
            Err(e) => Err(AgeError::Io(e)),
        }
    }
}

impl AgeBackend for AgeCli {
    fn ensure_available(&self) -> AgeResult<()> {
        Self::check_binary(AGE_BIN)?;
        Self::check_binary(KEYGEN_BIN)
    }

    fn generate_identity(&self) -> AgeResult<Vec<u8>> {
        let keygen = Self::run(KEYGEN_BIN, &[], None)?;
        if !keygen.status.success() {
            return Err(AgeError::KeygenFailed(format!(
                "{} exited with {}",
                KEYGEN_BIN, keygen.status
            )));
        }

        // Seal the fresh identity under a passphrase; age prompts twice.
        let sealed = Self::run(AGE_BIN, &["--passphrase", "--armor"], Some(&keygen.stdout))?;
        if !sealed.status.success() {
            return Err(AgeError::KeygenFailed(format!(
                "{} exited with {}",
                AGE_BIN, sealed.status
            )));
        }

        Ok(sealed.stdout)
    }

    fn recipient_of(&self, identity: &Path) -> AgeResult<String> {
        let opened = Self::run(
            AGE_BIN,
            &["--decrypt", &identity.display().to_string()],
            None,
        )?;
        if !opened.status.success() {
            return Err(AgeError::DecryptionFailed(format!(
                "could not open {}",
                identity.display()
            )));
        }

        let derived = Self::run(KEYGEN_BIN, &["-y", "-"], Some(&opened.stdout))?;
        if !derived.status.success() {
            return Err(AgeError::KeygenFailed(format!(
                "{} -y exited with {}",
                KEYGEN_BIN, derived.status
            )));
        }

        Ok(String::from_utf8_lossy(&derived.stdout).trim().to_string())
    }

    fn encrypt(&self, plaintext: &Secret, recipient: &str) -> AgeResult<Vec<u8>> {
        let output = Self::run(
            AGE_BIN,
            &["--encrypt", "--recipient", recipient],
            Some(plaintext.expose()),
        )?;
        if !output.status.success() {
            return Err(AgeError::EncryptionFailed(format!(
                "{} exited with {}",
                AGE_BIN, output.status
            )));
        }

        Ok(output.stdout)
    }

    fn decrypt(&self, identity: &Path, ciphertext: &[u8]) -> AgeResult<Secret> {
        let output = Self::run(
            AGE_BIN,
            &[
                "--decrypt",
                "--identity",
                &identity.display().to_string(),
            ],
            Some(ciphertext),
        )?;
        if !output.status.success() {
            return Err(AgeError::DecryptionFailed(format!(
                "{} exited with {}",
                AGE_BIN, output.status
            )));
        }

        Ok(Secret::new(output.stdout))
    }
}
