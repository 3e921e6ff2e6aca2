//! notes-core: identity, token and note handling for the notes service.
//!
//! Everything here is transport-agnostic. Persistence is reached through the
//! traits in [`storage`], and every note operation takes the caller's resolved
//! [`Identity`] as a mandatory scoping parameter.
//!
//! Components, leaves first:
//! - [`auth::Authenticator`] verifies username/password pairs
//! - [`auth::TokenRegistry`] issues and resolves opaque tokens
//! - [`auth::RequestAuthenticator`] turns an `Authorization` header into an identity
//! - [`notes::NoteRepository`] owner-scoped note CRUD
//! - [`search`] substring search over the caller's own notes
//! - [`NotesService`] composes the above into the surface the router calls

pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod notes;
pub mod search;
pub mod service;
pub mod storage;

pub use config::{NotesConfig, PasswordConfig, SearchConfig, TokenConfig};
pub use error::{Error, FieldErrors, Result};
pub use model::{Identity, IdentityId, Note, NoteDraft, NoteId, NotePatch, Token};
pub use service::NotesService;
pub use storage::{LocalStore, StorageError};
