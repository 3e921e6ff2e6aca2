//! Opaque token issuance and resolution.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::config::TokenConfig;
use crate::error::{Error, Result};
use crate::model::{Identity, IdentityId, Token, TokenBinding};
use crate::storage::{IdentityStore, StorageError, TokenStore};

/// Random bytes per token; hex-encoded this gives a 40 character key.
const TOKEN_BYTES: usize = 20;

/// How many fresh keys to try if a generated key is already taken.
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Maps token keys to identities. At most one live token per identity.
pub struct TokenRegistry {
    tokens: Arc<dyn TokenStore>,
    identities: Arc<dyn IdentityStore>,
    lifetime: Option<Duration>,
}

impl TokenRegistry {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        identities: Arc<dyn IdentityStore>,
        config: &TokenConfig,
    ) -> Self {
        // Lifetimes beyond what chrono can represent are clamped, not dropped
        let lifetime = config.lifetime_secs.map(|secs| {
            i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX)
        });

        Self {
            tokens,
            identities,
            lifetime,
        }
    }

    /// Return the identity's token, creating one if it has none (or only an
    /// expired one).
    ///
    /// The check-and-set happens inside the store in one step, so concurrent
    /// logins for the same identity all receive the same token.
    pub async fn issue_or_reuse(&self, identity: &Identity) -> Result<Token> {
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let now = Utc::now();
            let candidate = TokenBinding {
                key: generate_key(),
                identity_id: identity.id,
                created_at: now,
                expires_at: self.expiry(now),
            };

            match self.tokens.get_or_insert(candidate, now).await {
                Ok(binding) => return Ok(Token(binding.key)),
                Err(StorageError::DuplicateToken) => {
                    tracing::debug!("Generated token key collided, retrying");
                }
                // Identity deleted between password check and issuance
                Err(StorageError::UnknownIdentity(_)) => return Err(Error::InvalidCredentials),
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::Storage(StorageError::DuplicateToken))
    }

    /// Expiry for a token issued at `now`. Saturates at the latest
    /// representable instant.
    fn expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lifetime.map(|lifetime| {
            now.checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }

    /// Look up the identity bound to `key`.
    ///
    /// Unknown keys, expired bindings and bindings whose identity is gone all
    /// resolve to `None`.
    pub async fn resolve(&self, key: &str) -> Result<Option<Identity>> {
        let Some(binding) = self.tokens.binding_by_key(key).await? else {
            return Ok(None);
        };
        if binding.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(self.identities.identity_by_id(binding.identity_id).await?)
    }

    /// Drop the identity's token. Returns `false` if it had none.
    pub async fn revoke(&self, identity: IdentityId) -> Result<bool> {
        Ok(self.tokens.remove_binding(identity).await?)
    }
}

/// Generate a cryptographically random token key.
pub fn generate_key() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    hex::encode(bytes)
}
