//! Persistence traits and error types.
//!
//! The core never owns storage. Whatever composes the service hands each
//! component an `Arc<dyn …Store>`, so a database-backed implementation can
//! replace [`LocalStore`](super::LocalStore) without touching the core.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Identity, IdentityId, Note, NoteDraft, NoteId, NotePatch, TokenBinding};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Username uniqueness violated
    #[error("Username already taken: {username}")]
    DuplicateUsername { username: String },

    /// Binding requested for an identity that does not exist
    #[error("Unknown identity: {0}")]
    UnknownIdentity(IdentityId),

    /// Token key already bound to a different identity
    #[error("Token key already bound to another identity")]
    DuplicateToken,

    /// I/O error while persisting
    #[error("I/O error: {0}")]
    Io(String),

    /// Snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A writer panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Identity records (the credential store).
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new identity. Fails with `DuplicateUsername` if the username
    /// is already registered.
    async fn insert_identity(&self, identity: Identity) -> Result<Identity, StorageError>;

    async fn identity_by_username(&self, username: &str)
    -> Result<Option<Identity>, StorageError>;

    async fn identity_by_id(&self, id: IdentityId) -> Result<Option<Identity>, StorageError>;

    /// Delete an identity together with its notes and token binding.
    ///
    /// Returns `false` if no such identity existed.
    async fn delete_identity(&self, id: IdentityId) -> Result<bool, StorageError>;
}

/// Token-to-identity bindings.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Atomic get-or-create keyed by `candidate.identity_id`.
    ///
    /// Returns the binding already held by the identity unless it has expired
    /// as of `now`; otherwise stores `candidate` (replacing the expired one) and
    /// returns it. Fails with `DuplicateToken` if `candidate.key` is bound to a
    /// different identity, and with `UnknownIdentity` if the identity is gone.
    async fn get_or_insert(
        &self,
        candidate: TokenBinding,
        now: DateTime<Utc>,
    ) -> Result<TokenBinding, StorageError>;

    async fn binding_by_key(&self, key: &str) -> Result<Option<TokenBinding>, StorageError>;

    /// Remove the binding held by `identity`. Returns `false` if there was none.
    async fn remove_binding(&self, identity: IdentityId) -> Result<bool, StorageError>;
}

/// Notes, always addressed through their owner.
///
/// Every lookup matches on `(owner, id)` in one step: a note owned by a
/// different identity is reported exactly like a missing one.
#[async_trait::async_trait]
pub trait NoteStore: Send + Sync {
    /// Store a new note owned by `owner`, with `created_at == updated_at == now`.
    async fn insert_note(
        &self,
        owner: IdentityId,
        draft: NoteDraft,
        now: DateTime<Utc>,
    ) -> Result<Note, StorageError>;

    /// All notes owned by `owner`, in ascending id order.
    async fn notes_for_owner(&self, owner: IdentityId) -> Result<Vec<Note>, StorageError>;

    async fn note_for_owner(
        &self,
        owner: IdentityId,
        id: NoteId,
    ) -> Result<Option<Note>, StorageError>;

    /// Apply `patch` to the note if `owner` owns it. `None` if not found.
    async fn update_note_for_owner(
        &self,
        owner: IdentityId,
        id: NoteId,
        patch: NotePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Note>, StorageError>;

    /// Returns `false` if `owner` has no note with this id.
    async fn delete_note_for_owner(&self, owner: IdentityId, id: NoteId)
    -> Result<bool, StorageError>;
}
