//! Random password generation.
//!
//! Draws bytes from the system CSPRNG and keeps only those matching a
//! character pattern, so every kept byte is uniform over the allowed
//! set. Patterns combine POSIX-style classes (`[:alnum:]`, `[:digit:]`,
//! ...) with literal extra characters, e.g. the default `[:alnum:]_`.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::models::Secret;

/// Generation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Pattern '{0}' matched no characters")]
    GenerationFailed(String),
}

pub type GenerateResult<T> = Result<T, GenerateError>;

/// Enough random input to fill any sane length/pattern combination.
/// The sparsest supported class ([:digit:], 10/256 bytes accepted)
/// still clears a 64x budget with overwhelming probability.
const DRAW_FACTOR: usize = 64;

/// A character-class filter over ASCII bytes.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    allowed: [bool; 256],
}

impl Pattern {
    /// Parse a pattern string. `[:class:]` tokens expand to the POSIX
    /// class of the same name; every other character is a literal.
    /// Unknown class names are kept as literals, matching what a shell
    /// `tr` would do with them.
    pub fn parse(pattern: &str) -> Self {
        let mut allowed = [false; 256];
        let mut rest = pattern;

        while !rest.is_empty() {
            if let Some((tail, idx)) = rest
                .strip_prefix("[:")
                .and_then(|tail| tail.find(":]").map(|i| (tail, i)))
            {
                if mark_class(&tail[..idx], &mut allowed) {
                    rest = &tail[idx + 2..];
                    continue;
                }
            }

            let ch = rest.chars().next().unwrap();
            if ch.is_ascii() {
                allowed[ch as usize] = true;
            }
            rest = &rest[ch.len_utf8()..];
        }

        Self {
            source: pattern.to_string(),
            allowed,
        }
    }

    pub fn accepts(&self, byte: u8) -> bool {
        self.allowed[byte as usize]
    }

    fn is_empty(&self) -> bool {
        !self.allowed.iter().any(|&a| a)
    }
}

/// Set every byte of a named POSIX class; false for unknown names.
fn mark_class(class: &str, allowed: &mut [bool; 256]) -> bool {
    let predicate: fn(u8) -> bool = match class {
        "alnum" => |b| b.is_ascii_alphanumeric(),
        "alpha" => |b| b.is_ascii_alphabetic(),
        "digit" => |b| b.is_ascii_digit(),
        "lower" => |b| b.is_ascii_lowercase(),
        "upper" => |b| b.is_ascii_uppercase(),
        "graph" => |b| b.is_ascii_graphic(),
        "punct" => |b| b.is_ascii_punctuation(),
        _ => return false,
    };

    for b in 0..=255u8 {
        if predicate(b) {
            allowed[b as usize] = true;
        }
    }
    true
}

/// Generate a random secret of exactly `length` bytes drawn from the
/// pattern's character set.
pub fn generate(pattern: &Pattern, length: usize) -> GenerateResult<Secret> {
    if pattern.is_empty() {
        return Err(GenerateError::GenerationFailed(pattern.source.clone()));
    }

    let mut accepted = Vec::with_capacity(length);
    let mut drawn = 0usize;
    let budget = length.max(1) * DRAW_FACTOR;
    let mut chunk = [0u8; 256];

    while accepted.len() < length && drawn < budget {
        OsRng.fill_bytes(&mut chunk);
        drawn += chunk.len();

        for &byte in chunk.iter() {
            if pattern.accepts(byte) {
                accepted.push(byte);
                if accepted.len() == length {
                    break;
                }
            }
        }
    }

    if accepted.len() < length {
        return Err(GenerateError::GenerationFailed(pattern.source.clone()));
    }

    Ok(Secret::new(accepted))
}
