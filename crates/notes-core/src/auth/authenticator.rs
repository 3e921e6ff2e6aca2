use std::sync::Arc;

use super::password::Passwords;
use crate::error::{Error, Result};
use crate::model::Identity;
use crate::storage::IdentityStore;

/// Verifies username/password pairs against the identity store.
pub struct Authenticator {
    identities: Arc<dyn IdentityStore>,
    passwords: Passwords,
    /// Verified against when the username is unknown, so that path costs
    /// the same as a wrong password.
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(identities: Arc<dyn IdentityStore>, passwords: Passwords) -> Result<Self> {
        let dummy_hash = passwords.hash("unknown-user-placeholder")?;
        Ok(Self {
            identities,
            passwords,
            dummy_hash,
        })
    }

    /// Returns the identity on success. Unknown usernames and wrong passwords
    /// both fail with [`Error::InvalidCredentials`].
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
        let identity = self.identities.identity_by_username(username).await?;

        let hash = identity
            .as_ref()
            .map(|identity| identity.password_hash.as_str())
            .unwrap_or(&self.dummy_hash);
        let matches = self.passwords.verify(password, hash)?;

        match identity {
            Some(identity) if matches => Ok(identity),
            _ => {
                tracing::warn!("Rejected login attempt for {:?}", username);
                Err(Error::InvalidCredentials)
            }
        }
    }
}
