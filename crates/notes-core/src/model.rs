//! Persisted entities and the input shapes accepted from callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier of a registered identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Argon2 PHC string, never the plaintext.
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// Opaque bearer credential returned by login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted token-to-identity binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBinding {
    pub key: String,
    pub identity_id: IdentityId,
    pub created_at: DateTime<Utc>,
    /// `None` means the token lives as long as the identity.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenBinding {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Server-assigned note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(NoteId)
    }
}

/// A note owned by exactly one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner: IdentityId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full set of caller-editable note fields. There is no owner field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Partial update. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<NoteDraft> for NotePatch {
    fn from(draft: NoteDraft) -> Self {
        Self {
            title: Some(draft.title),
            content: Some(draft.content),
        }
    }
}

impl NotePatch {
    /// Apply to `note`, refreshing `updated_at` without letting it move backwards.
    pub fn apply(self, note: &mut Note, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        note.updated_at = now.max(note.updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_note(at: DateTime<Utc>) -> Note {
        Note {
            id: NoteId(1),
            owner: IdentityId::new(),
            title: "Original".to_string(),
            content: "Body".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_patch_keeps_untouched_fields() {
        let at = Utc::now();
        let mut note = sample_note(at);
        let owner = note.owner;

        NotePatch {
            title: Some("Renamed".to_string()),
            content: None,
        }
        .apply(&mut note, at + Duration::seconds(5));

        assert_eq!(note.title, "Renamed");
        assert_eq!(note.content, "Body");
        assert_eq!(note.owner, owner);
        assert_eq!(note.created_at, at);
        assert_eq!(note.updated_at, at + Duration::seconds(5));
    }

    #[test]
    fn test_patch_never_moves_updated_at_backwards() {
        let at = Utc::now();
        let mut note = sample_note(at);

        NotePatch::from(NoteDraft::new("T", "C")).apply(&mut note, at - Duration::seconds(30));

        assert_eq!(note.updated_at, at);
    }

    #[test]
    fn test_token_binding_expiry() {
        let now = Utc::now();
        let mut binding = TokenBinding {
            key: "abc".to_string(),
            identity_id: IdentityId::new(),
            created_at: now,
            expires_at: None,
        };
        assert!(!binding.is_expired(now + Duration::days(365)));

        binding.expires_at = Some(now + Duration::seconds(10));
        assert!(!binding.is_expired(now));
        assert!(binding.is_expired(now + Duration::seconds(10)));
    }

    #[test]
    fn test_note_id_parses_from_path_segment() {
        assert_eq!("42".parse::<NoteId>().ok(), Some(NoteId(42)));
        assert!("abc".parse::<NoteId>().is_err());
    }
}
