// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// A stable identifier used across the model, store, and tool surfaces.
///
/// This does not enforce a UUID format; it only enforces that the id is a
/// usable *path segment* (non-empty, no separators, not `.`/`..`), because
/// session ids become directory names under the store's data root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id_segment(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    /// Generates a fresh random id (UUID v4).
    pub fn generate() -> Self {
        let value = uuid::Uuid::new_v4().to_string();
        Self::new(value).expect("generated uuid is a valid id segment")
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl<T> TryFrom<String> for Id<T> {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Empty,
    ContainsSeparator,
    Reserved,
    TooLong,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("id must not be empty"),
            Self::ContainsSeparator => f.write_str("id must not contain '/' or '\\'"),
            Self::Reserved => f.write_str("id must not be '.' or '..'"),
            Self::TooLong => f.write_str("id must be at most 128 bytes"),
        }
    }
}

impl std::error::Error for IdError {}

const MAX_ID_LEN: usize = 128;

fn validate_id_segment(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if value.contains('/') || value.contains('\\') {
        return Err(IdError::ContainsSeparator);
    }
    if value == "." || value == ".." {
        return Err(IdError::Reserved);
    }
    if value.len() > MAX_ID_LEN {
        return Err(IdError::TooLong);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionIdTag {}
pub type SessionId = Id<SessionIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditIdTag {}
pub type EditId = Id<EditIdTag>;

#[cfg(test)]
mod tests {
    use super::{EditId, IdError, SessionId};

    #[test]
    fn accepts_plain_segments() {
        assert!(SessionId::new("abc-123").is_ok());
        assert!(EditId::new("e-1").is_ok());
    }

    #[test]
    fn rejects_separators_and_reserved_names() {
        assert_eq!(SessionId::new("").unwrap_err(), IdError::Empty);
        assert_eq!(
            SessionId::new("a/b").unwrap_err(),
            IdError::ContainsSeparator
        );
        assert_eq!(
            SessionId::new("a\\b").unwrap_err(),
            IdError::ContainsSeparator
        );
        assert_eq!(SessionId::new(".").unwrap_err(), IdError::Reserved);
        assert_eq!(SessionId::new("..").unwrap_err(), IdError::Reserved);
        assert_eq!(
            SessionId::new("x".repeat(129)).unwrap_err(),
            IdError::TooLong
        );
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
