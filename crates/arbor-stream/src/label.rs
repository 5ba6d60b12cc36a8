//! Stream label validation.
//!
//! Labels become symlink names directly under `stream/`, so the rules
//! exist to keep them unambiguous filesystem entries:
//! - non-empty, at most [`MAX_LABEL_LEN`] bytes
//! - no `/`, whitespace, or control characters
//! - no leading `.` and no `..` anywhere
//! - must not end with `.tmp`, which is reserved for in-flight links

use crate::error::{StreamError, StreamResult};

/// Maximum label length in bytes, within common filename limits.
pub const MAX_LABEL_LEN: usize = 200;

// Suffix used for the temporary link during an atomic replace.
pub(crate) const TMP_SUFFIX: &str = ".tmp";

/// Validate a stream label, returning `Ok(())` if usable.
///
/// # Examples
///
/// ```
/// use arbor_stream::label::validate_label;
///
/// assert!(validate_label("s1").is_ok());
/// assert!(validate_label("daily-backup.2026").is_ok());
/// assert!(validate_label("").is_err());
/// assert!(validate_label("a/b").is_err());
/// ```
pub fn validate_label(label: &str) -> StreamResult<()> {
    if label.is_empty() {
        return Err(invalid(label, "label must not be empty"));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(invalid(
            label,
            format!("label exceeds {MAX_LABEL_LEN} bytes"),
        ));
    }
    if let Some(ch) = label
        .chars()
        .find(|ch| *ch == '/' || ch.is_whitespace() || ch.is_control())
    {
        return Err(invalid(label, format!("contains forbidden character {ch:?}")));
    }
    if label.starts_with('.') {
        return Err(invalid(label, "must not start with '.'"));
    }
    if label.contains("..") {
        return Err(invalid(label, "must not contain '..'"));
    }
    if label.ends_with(TMP_SUFFIX) {
        return Err(invalid(label, "the '.tmp' suffix is reserved"));
    }
    Ok(())
}

fn invalid(label: &str, reason: impl Into<String>) -> StreamError {
    StreamError::InvalidLabel {
        label: label.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_label("s1").is_ok());
        assert!(validate_label("logs").is_ok());
        assert!(validate_label("backup-2026.08").is_ok());
        assert!(validate_label("under_score").is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(validate_label("").is_err());
        assert!(validate_label(&"x".repeat(MAX_LABEL_LEN + 1)).is_err());
        assert!(validate_label(&"x".repeat(MAX_LABEL_LEN)).is_ok());
    }

    #[test]
    fn rejects_separators_and_whitespace() {
        assert!(validate_label("a/b").is_err());
        assert!(validate_label("has space").is_err());
        assert!(validate_label("has\ttab").is_err());
        assert!(validate_label("has\nnewline").is_err());
        assert!(validate_label("bell\u{7}").is_err());
    }

    #[test]
    fn rejects_dot_traversal() {
        assert!(validate_label(".hidden").is_err());
        assert!(validate_label("a..b").is_err());
        assert!(validate_label("..").is_err());
        // An interior single dot is fine.
        assert!(validate_label("v1.0").is_ok());
    }

    #[test]
    fn rejects_reserved_suffix() {
        assert!(validate_label("pending.tmp").is_err());
        assert!(validate_label("tmp").is_ok());
    }

    #[test]
    fn error_names_the_label() {
        match validate_label("a/b").unwrap_err() {
            StreamError::InvalidLabel { label, .. } => assert_eq!(label, "a/b"),
            other => panic!("expected InvalidLabel, got {other:?}"),
        }
    }
}
