//! Integration tests for the sealpass store.
//!
//! These exercise the full secret lifecycle over the public API, with
//! an in-memory stand-in for the age tool so no subprocesses or
//! passphrases are involved.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use sealpass::age::{AgeBackend, AgeResult};
use sealpass::clipboard::{self, ClipboardResult, ClipboardSink};
use sealpass::generate::{generate, Pattern};
use sealpass::paths::{PathError, SecretName};
use sealpass::prompt::Prompter;
use sealpass::store::{Store, StoreError};
use sealpass::Secret;

/// In-memory stand-in for the age tool: ciphertext is the recipient
/// tag plus the reversed plaintext.
struct MemoryBackend;

const FAKE_IDENTITY: &[u8] = b"AGE-SECRET-KEY-TEST";
const FAKE_RECIPIENT: &str = "age1test";

impl AgeBackend for MemoryBackend {
    fn ensure_available(&self) -> AgeResult<()> {
        Ok(())
    }

    fn generate_identity(&self) -> AgeResult<Vec<u8>> {
        Ok(FAKE_IDENTITY.to_vec())
    }

    fn recipient_of(&self, identity: &Path) -> AgeResult<String> {
        let bytes = fs::read(identity)?;
        assert_eq!(bytes, FAKE_IDENTITY);
        Ok(FAKE_RECIPIENT.to_string())
    }

    fn encrypt(&self, plaintext: &Secret, recipient: &str) -> AgeResult<Vec<u8>> {
        let mut out = format!("{}:", recipient).into_bytes();
        out.extend(plaintext.expose().iter().rev());
        Ok(out)
    }

    fn decrypt(&self, _identity: &Path, ciphertext: &[u8]) -> AgeResult<Secret> {
        let tag = format!("{}:", FAKE_RECIPIENT);
        let body = &ciphertext[tag.len()..];
        Ok(Secret::new(body.iter().rev().copied().collect::<Vec<_>>()))
    }
}

/// Prompter with a fixed confirmation answer.
struct Always(bool);

impl Prompter for Always {
    fn confirm(&self, _prompt: &str) -> io::Result<bool> {
        Ok(self.0)
    }

    fn read_secret(&self, _prompt: &str) -> io::Result<Secret> {
        Ok(Secret::from("unused"))
    }
}

/// Create a store with a master key in a fresh temp directory.
fn create_test_store() -> (tempfile::TempDir, Store) {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let store = Store::open(temp_dir.path().join("store"), Box::new(MemoryBackend))
        .expect("Failed to open store");
    store
        .generate_master_key()
        .expect("Failed to generate master key");
    (temp_dir, store)
}

fn name(raw: &str) -> SecretName {
    SecretName::parse(raw).unwrap()
}

// ============================================================================
// Name Validation Tests
// ============================================================================

#[test]
fn test_traversal_names_rejected() {
    for raw in ["../escape", "a/../b", "a/..", "..", ".", "./a", "a/./b"] {
        assert!(
            matches!(SecretName::parse(raw), Err(PathError::PathTraversal(_))),
            "expected rejection of {:?}",
            raw
        );
    }
}

#[test]
fn test_absolute_names_rejected() {
    assert!(matches!(
        SecretName::parse("/etc/passwd"),
        Err(PathError::InvalidName(_))
    ));
}

#[test]
fn test_rejected_name_causes_no_mutation() {
    let (_temp_dir, store) = create_test_store();

    // Validation fails before the store is ever consulted; the root
    // holds nothing but the master key afterwards.
    assert!(SecretName::parse("../escape").is_err());

    let entries: Vec<_> = fs::read_dir(store.root())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec!["identity.age"]);
}

// ============================================================================
// Master Key Lifecycle Tests
// ============================================================================

#[test]
fn test_fresh_store_requires_master_key() {
    let temp_dir = tempdir().unwrap();
    let store = Store::open(temp_dir.path().join("store"), Box::new(MemoryBackend)).unwrap();
    let n = name("anything");

    assert!(matches!(
        store.add(&n, &Secret::from("x")),
        Err(StoreError::MissingMasterKey)
    ));
    assert!(matches!(store.read(&n), Err(StoreError::MissingMasterKey)));
    assert!(matches!(store.list(), Err(StoreError::MissingMasterKey)));
    assert!(matches!(
        store.delete(&n, &Always(true)),
        Err(StoreError::MissingMasterKey)
    ));
}

#[test]
fn test_master_key_generated_once() {
    let (_temp_dir, store) = create_test_store();

    assert!(store.master_key().exists());
    assert!(store.generate_master_key().is_err());
}

// ============================================================================
// Secret Lifecycle Tests
// ============================================================================

#[test]
fn test_round_trip() {
    let (_temp_dir, store) = create_test_store();
    let n = name("work/mail/imap");
    let secret = Secret::from("s3cret bytes \x01\x02");

    store.add(&n, &secret).unwrap();
    assert_eq!(store.read(&n).unwrap(), secret);
}

#[test]
fn test_add_existing_fails_and_preserves() {
    let (_temp_dir, store) = create_test_store();
    let n = name("github");

    store.add(&n, &Secret::from("first")).unwrap();
    assert!(matches!(
        store.add(&n, &Secret::from("second")),
        Err(StoreError::AlreadyExists(_))
    ));
    assert_eq!(store.read(&n).unwrap().expose(), b"first");
}

#[test]
fn test_show_missing_fails() {
    let (_temp_dir, store) = create_test_store();
    assert!(matches!(
        store.read(&name("absent")),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_list_after_adds() {
    let (_temp_dir, store) = create_test_store();
    for raw in ["a", "b/c", "b/d"] {
        store.add(&name(raw), &Secret::from(raw)).unwrap();
    }

    let mut names: Vec<String> = store.list().unwrap().collect();
    names.sort();
    assert_eq!(names, vec!["a", "b/c", "b/d"]);
}

// ============================================================================
// Deletion Tests
// ============================================================================

#[test]
fn test_delete_last_entry_prunes_category() {
    let (_temp_dir, store) = create_test_store();
    let n = name("sites/forum");
    store.add(&n, &Secret::from("s")).unwrap();

    store.delete(&n, &Always(true)).unwrap();

    assert!(!store.root().join("sites").exists());
}

#[test]
fn test_delete_with_sibling_keeps_category() {
    let (_temp_dir, store) = create_test_store();
    store.add(&name("sites/forum"), &Secret::from("a")).unwrap();
    store.add(&name("sites/shop"), &Secret::from("b")).unwrap();

    store.delete(&name("sites/forum"), &Always(true)).unwrap();

    assert!(store.root().join("sites").is_dir());
    assert!(store.contains(&name("sites/shop")));
}

#[test]
fn test_delete_missing_is_noop() {
    let (_temp_dir, store) = create_test_store();
    store.delete(&name("ghost"), &Always(true)).unwrap();
}

#[test]
fn test_delete_master_key_name_is_noop() {
    let (_temp_dir, store) = create_test_store();

    store.delete(&name("identity"), &Always(true)).unwrap();
    assert!(store.master_key().exists());
}

#[test]
fn test_delete_declined_keeps_entry() {
    let (_temp_dir, store) = create_test_store();
    let n = name("keep");
    store.add(&n, &Secret::from("s")).unwrap();

    store.delete(&n, &Always(false)).unwrap();
    assert!(store.contains(&n));
}

// ============================================================================
// Password Generation Tests
// ============================================================================

#[test]
fn test_digit_pattern_generates_digits() {
    let pattern = Pattern::parse("[:digit:]");
    let secret = generate(&pattern, 6).unwrap();

    assert_eq!(secret.len(), 6);
    assert!(secret.expose().iter().all(|b| b.is_ascii_digit()));
}

#[test]
fn test_generated_secrets_differ() {
    let pattern = Pattern::parse("[:alnum:]_");
    assert_ne!(
        generate(&pattern, 16).unwrap(),
        generate(&pattern, 16).unwrap()
    );
}

// ============================================================================
// Clipboard Session Tests
// ============================================================================

/// Records the last value written.
struct MemorySink {
    contents: Mutex<Vec<u8>>,
}

impl ClipboardSink for MemorySink {
    fn set(&self, text: &[u8]) -> ClipboardResult<()> {
        *self.contents.lock().unwrap() = text.to_vec();
        Ok(())
    }
}

#[test]
fn test_copied_secret_clears_after_timeout() {
    let (_temp_dir, store) = create_test_store();
    let n = name("clip/me");
    store.add(&n, &Secret::from("clipboard secret")).unwrap();

    let sink = Arc::new(MemorySink {
        contents: Mutex::new(Vec::new()),
    });

    let secret = store.read(&n).unwrap();
    let started = std::time::Instant::now();
    let guard = clipboard::copy(sink.clone(), &secret, Some(2)).unwrap();

    // Synchronous part only: the secret is on the clipboard and the
    // call returned well before the timeout.
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
    assert_eq!(*sink.contents.lock().unwrap(), b"clipboard secret");

    guard.unwrap().wait();
    assert!(started.elapsed() >= std::time::Duration::from_secs(2));
    assert!(sink.contents.lock().unwrap().is_empty());
}
