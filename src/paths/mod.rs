//! Secret-name validation.
//!
//! Secret names are used directly as paths relative to the store root,
//! so this check is the only barrier against an entry escaping the
//! store. It must run before any existence check, any filesystem
//! mutation, and before the encryption tool ever sees the name.

use thiserror::Error;

/// Name validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("No secret name given")]
    MissingArgument,

    #[error("Invalid secret name: {0}")]
    InvalidName(String),

    #[error("Secret name escapes the store: {0}")]
    PathTraversal(String),
}

pub type PathResult<T> = Result<T, PathError>;

/// A validated secret name.
///
/// Slash-delimited, relative, free of `.`/`..` segments. The segments
/// before the last slash form the category path (directories under the
/// store root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretName(String);

impl SecretName {
    /// Validate a raw name. Rules apply in order: non-empty, no leading
    /// slash, no `.` or `..` path segment.
    pub fn parse(raw: &str) -> PathResult<Self> {
        if raw.is_empty() {
            return Err(PathError::MissingArgument);
        }

        if raw.starts_with('/') {
            return Err(PathError::InvalidName(raw.to_string()));
        }

        if raw.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(PathError::PathTraversal(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The category path: everything before the last slash, empty when
    /// the name has no slash at all.
    pub fn category(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl std::fmt::Display for SecretName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name() {
        assert_eq!(SecretName::parse(""), Err(PathError::MissingArgument));
    }

    #[test]
    fn test_leading_slash() {
        assert!(matches!(
            SecretName::parse("/etc/shadow"),
            Err(PathError::InvalidName(_))
        ));
    }

    #[test]
    fn test_traversal_segments() {
        for name in [
            "../outside",
            "a/../b",
            "a/..",
            "..",
            ".",
            "./a",
            "a/./b",
            "a/b/.",
        ] {
            assert!(
                matches!(SecretName::parse(name), Err(PathError::PathTraversal(_))),
                "expected traversal rejection for {:?}",
                name
            );
        }
    }

    #[test]
    fn test_dotfiles_are_allowed() {
        // A leading dot in a segment is a hidden file, not traversal.
        assert!(SecretName::parse(".config").is_ok());
        assert!(SecretName::parse("mail/.drafts").is_ok());
        assert!(SecretName::parse("a..b").is_ok());
    }

    #[test]
    fn test_category_split() {
        assert_eq!(SecretName::parse("github").unwrap().category(), "");
        assert_eq!(SecretName::parse("work/github").unwrap().category(), "work");
        assert_eq!(
            SecretName::parse("work/mail/imap").unwrap().category(),
            "work/mail"
        );
    }
}
