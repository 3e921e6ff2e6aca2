//! Persistence seam for identities, tokens and notes.

mod local;
mod traits;

pub use local::LocalStore;
pub use traits::{IdentityStore, NoteStore, StorageError, TokenStore};
