//! The operations exposed to the routing layer.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{Authenticator, Passwords, RequestAuthenticator, TokenRegistry};
use crate::config::NotesConfig;
use crate::error::{Error, FieldErrors, Result};
use crate::model::{Identity, IdentityId, Note, NoteDraft, NoteId, NotePatch, Token};
use crate::notes::NoteRepository;
use crate::storage::{IdentityStore, LocalStore, NoteStore, StorageError, TokenStore};

pub const USERNAME_MAX_CHARS: usize = 150;

/// Composes the authentication components and the note repository.
///
/// Stores are injected; nothing here is global. Cloning the `Arc`s the
/// service was built from is how a caller shares state with it.
pub struct NotesService {
    identities: Arc<dyn IdentityStore>,
    passwords: Passwords,
    authenticator: Authenticator,
    registry: Arc<TokenRegistry>,
    requests: RequestAuthenticator,
    notes: NoteRepository,
}

impl NotesService {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        tokens: Arc<dyn TokenStore>,
        notes: Arc<dyn NoteStore>,
        config: &NotesConfig,
    ) -> Result<Self> {
        let passwords = Passwords::new(&config.passwords)?;
        let authenticator = Authenticator::new(identities.clone(), passwords.clone())?;
        let registry = Arc::new(TokenRegistry::new(
            tokens,
            identities.clone(),
            &config.tokens,
        ));

        Ok(Self {
            identities,
            passwords,
            authenticator,
            requests: RequestAuthenticator::new(registry.clone()),
            registry,
            notes: NoteRepository::new(notes, config.search.clone()),
        })
    }

    /// Build on a single [`LocalStore`] serving all three tables.
    pub fn with_local_store(store: Arc<LocalStore>, config: &NotesConfig) -> Result<Self> {
        Self::new(store.clone(), store.clone(), store, config)
    }

    // --- Identities ---

    /// Create a new identity. The password is stored only as an argon2 hash.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<Identity> {
        let email = email.map(str::trim).filter(|email| !email.is_empty());
        validate_registration(username, password, email)?;

        let identity = Identity {
            id: IdentityId::new(),
            username: username.to_string(),
            email: email.map(str::to_string),
            password_hash: self.passwords.hash(password)?,
            date_joined: Utc::now(),
        };

        let identity = match self.identities.insert_identity(identity).await {
            Ok(identity) => identity,
            Err(StorageError::DuplicateUsername { .. }) => {
                return Err(Error::field(
                    "username",
                    "A user with that username already exists.",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Registered {} ({})", identity.username, identity.id);
        Ok(identity)
    }

    /// Verify credentials and hand out the identity's token.
    pub async fn login(&self, username: &str, password: &str) -> Result<Token> {
        let identity = self.authenticator.authenticate(username, password).await?;
        let token = self.registry.issue_or_reuse(&identity).await?;
        tracing::info!("Issued token for {}", identity.username);
        Ok(token)
    }

    /// Revoke the caller's token. A later login issues a new one.
    pub async fn logout(&self, identity: &Identity) -> Result<()> {
        if self.registry.revoke(identity.id).await? {
            tracing::info!("Revoked token for {}", identity.username);
        }
        Ok(())
    }

    /// Remove the identity along with its notes and token.
    pub async fn delete_identity(&self, identity: &Identity) -> Result<()> {
        if !self.identities.delete_identity(identity.id).await? {
            return Err(Error::NotFound);
        }
        tracing::info!("Deleted identity {} ({})", identity.username, identity.id);
        Ok(())
    }

    pub async fn authenticate_request(&self, header: Option<&str>) -> Result<Identity> {
        self.requests.authenticate_request(header).await
    }

    // --- Notes ---

    pub async fn list_notes(&self, identity: &Identity, search: Option<&str>) -> Result<Vec<Note>> {
        self.notes.search(identity, search).await
    }

    pub async fn get_note(&self, identity: &Identity, id: NoteId) -> Result<Note> {
        self.notes.get(identity, id).await
    }

    pub async fn create_note(&self, identity: &Identity, draft: NoteDraft) -> Result<Note> {
        self.notes.create(identity, draft).await
    }

    pub async fn update_note(
        &self,
        identity: &Identity,
        id: NoteId,
        draft: NoteDraft,
    ) -> Result<Note> {
        self.notes.update(identity, id, draft).await
    }

    pub async fn patch_note(&self, identity: &Identity, id: NoteId, patch: NotePatch) -> Result<Note> {
        self.notes.patch(identity, id, patch).await
    }

    pub async fn delete_note(&self, identity: &Identity, id: NoteId) -> Result<()> {
        self.notes.delete(identity, id).await
    }
}

fn validate_registration(username: &str, password: &str, email: Option<&str>) -> Result<()> {
    let mut errors = FieldErrors::default();

    if username.is_empty() {
        errors.push("username", "This field may not be blank.");
    } else if username.chars().count() > USERNAME_MAX_CHARS {
        errors.push(
            "username",
            format!(
                "Ensure this field has no more than {} characters.",
                USERNAME_MAX_CHARS
            ),
        );
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.push(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    if password.is_empty() {
        errors.push("password", "This field may not be blank.");
    }

    if let Some(email) = email {
        if !looks_like_email(email) {
            errors.push("email", "Enter a valid email address.");
        }
    }

    errors.into_result()
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
