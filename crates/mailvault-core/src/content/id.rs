//! Filesystem-safe content ids.

use sha2::{Digest, Sha256};

/// Longest normalized id used verbatim as a directory name.
pub const MAX_CONTENT_ID_LEN: usize = 50;

const HASHED_ID_LEN: usize = 32;

/// Derives a directory name from an external message id.
///
/// Angle brackets are trimmed, `@` becomes `_at_` and every other character
/// outside `[A-Za-z0-9_-]` becomes `_`. Ids whose normalized form is longer
/// than [`MAX_CONTENT_ID_LEN`] are replaced by the first 32 hex digits of the
/// SHA-256 of the original id.
#[must_use]
pub fn content_id(message_id: &str) -> String {
    let trimmed = message_id.trim().trim_matches(|c| c == '<' || c == '>');

    let mut clean = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '@' => clean.push_str("_at_"),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => clean.push(c),
            _ => clean.push('_'),
        }
    }

    if clean.is_empty() || clean.len() > MAX_CONTENT_ID_LEN {
        let mut hex = format!("{:x}", Sha256::digest(message_id.as_bytes()));
        hex.truncate(HASHED_ID_LEN);
        return hex;
    }
    clean
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn typical_message_id() {
        assert_eq!(content_id("<abc.123@mail.example.com>"), "abc_123_at_mail_example_com");
    }

    #[test]
    fn separators_are_replaced() {
        assert_eq!(content_id("a/b\\c..d"), "a_b_c__d");
    }

    #[test]
    fn long_ids_are_hashed() {
        let long = format!("<{}@example.com>", "x".repeat(80));
        let id = content_id(&long);
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, content_id(&long));
    }

    #[test]
    fn empty_id_is_hashed_not_blank() {
        assert_eq!(content_id("<>").len(), 32);
        // SHA-256 of the empty string.
        assert_eq!(content_id(""), "e3b0c44298fc1c149afbf4c8996fb924");
    }

    proptest! {
        #[test]
        fn never_contains_path_separators(raw in ".*") {
            let id = content_id(&raw);
            prop_assert!(!id.is_empty());
            prop_assert!(id.len() <= MAX_CONTENT_ID_LEN);
            prop_assert!(!id.contains('/') && !id.contains('\\') && !id.contains('.'));
        }
    }
}
