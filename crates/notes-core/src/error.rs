//! Error taxonomy shared by every core operation.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

/// Message recorded for a field absent from the input.
pub const FIELD_REQUIRED: &str = "This field is required.";

/// Errors surfaced to the routing layer.
///
/// None of these are fatal to the process, and an operation that fails with
/// any of them has left persisted state untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid input fields.
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    /// Login failure. Unknown user and wrong password are not distinguished.
    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    /// Missing, malformed or unresolvable token. All causes look the same.
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,

    /// Resource absent, or owned by somebody else.
    #[error("Not found")]
    NotFound,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    /// Shorthand for a validation failure on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.push(field, message);
        Error::Validation(errors)
    }
}

/// Per-field validation messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(", "))?;
            first = false;
        }
        Ok(())
    }
}
