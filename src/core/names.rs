// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Symbol and label name validation.
//!
//! DataCode1 names are 1 to 12 upper-case alphanumeric characters, starting
//! with a letter, and may not collide with a directive keyword.

use std::fmt;

/// Directive keywords that can never be used as symbol or label names.
pub const RESERVED_WORDS: [&str; 7] = [
    "ALP", "DATA", "BEGIN", "END", "ENTRY", "EXTERNAL", "FINISH",
];

/// Maximum name length (extended DataCode allowed 12 significant characters).
pub const MAX_NAME_LEN: usize = 12;

/// Why a candidate name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameError {
    message: String,
}

impl NameError {
    fn new(message: String) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for NameError {}

/// Validate a candidate symbol/label name.
///
/// Rules are checked in order: reserved word, length, leading character,
/// remaining characters. The error carries the first failing rule.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if RESERVED_WORDS.contains(&name) {
        return Err(NameError::new(format!("'{name}' is a reserved word")));
    }

    let n = name.chars().count();
    if n < 1 || n > MAX_NAME_LEN {
        return Err(NameError::new(format!(
            "'{name}' length {n} not in range 1 to {MAX_NAME_LEN}"
        )));
    }

    let mut chars = name.chars();
    let first = chars.next().unwrap_or(' ');
    if !first.is_ascii_uppercase() {
        return Err(NameError::new(format!(
            "'{name}' does not start with an upper case letter"
        )));
    }

    for c in chars {
        if !c.is_ascii_uppercase() && !c.is_ascii_digit() {
            return Err(NameError::new(format!(
                "'{c}' in '{name}' is not an upper case alpha numeric character"
            )));
        }
    }

    Ok(())
}

/// Convenience predicate over [`validate_name`].
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    validate_name(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert!(is_valid_name("A"));
        assert!(is_valid_name("START"));
        assert!(is_valid_name("LOOP2"));
        assert!(is_valid_name("ABCDEFGHIJK2"));
    }

    #[test]
    fn rejects_reserved_words() {
        for word in RESERVED_WORDS {
            let err = validate_name(word).unwrap_err();
            assert!(err.message().contains("reserved"), "{err}");
        }
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!(validate_name("").is_err());
        assert!(validate_name("ABCDEFGHIJKLM").is_err());
    }

    #[test]
    fn rejects_bad_leading_character() {
        assert!(validate_name("1ABC").is_err());
        assert!(validate_name("aBC").is_err());
        assert!(validate_name("_AB").is_err());
    }

    #[test]
    fn rejects_bad_tail_characters() {
        assert!(validate_name("AbC").is_err());
        assert!(validate_name("A_B").is_err());
        assert!(validate_name("A.B").is_err());
    }

    #[test]
    fn validity_is_shape_only() {
        // The same name is judged identically wherever it appears.
        assert_eq!(is_valid_name("TOTAL"), is_valid_name("TOTAL"));
    }
}
