//! Dotted configuration keys

use std::fmt;

use crate::domain::error::DomainError;

/// Separator between segments of a dotted key (`helmet.value.option`).
pub const KEY_SEPARATOR: char = '.';

/// A validated, non-empty sequence of key segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath<'k> {
    segments: Vec<&'k str>,
}

impl<'k> KeyPath<'k> {
    /// Splits `key` on `.`; every segment must be non-empty.
    pub fn parse(key: &'k str) -> Result<Self, DomainError> {
        let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(DomainError::InvalidKey(key.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[&'k str] {
        &self.segments
    }

    /// All segments but the last, and the last.
    pub fn split_last(&self) -> (&[&'k str], &'k str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last),
            // parse() never yields an empty path
            None => (&[], ""),
        }
    }
}

impl fmt::Display for KeyPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
