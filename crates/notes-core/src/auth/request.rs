//! Per-request identity resolution from the `Authorization` header.

use std::sync::Arc;

use super::tokens::TokenRegistry;
use crate::error::{Error, Result};
use crate::model::Identity;

/// Scheme keyword existing clients send. Matched exactly.
pub const KEYWORD: &str = "Bearer";

/// Extract the token key from `Bearer <token>`.
///
/// The value must be exactly two whitespace-separated parts with the first
/// equal to [`KEYWORD`].
pub fn parse_authorization(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let keyword = parts.next()?;
    let key = parts.next()?;
    if parts.next().is_some() || keyword != KEYWORD {
        return None;
    }
    Some(key)
}

pub struct RequestAuthenticator {
    registry: Arc<TokenRegistry>,
}

impl RequestAuthenticator {
    pub fn new(registry: Arc<TokenRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve the caller. Every failure is [`Error::Unauthenticated`].
    pub async fn authenticate_request(&self, header: Option<&str>) -> Result<Identity> {
        let Some(header) = header else {
            tracing::debug!("No Authorization header present");
            return Err(Error::Unauthenticated);
        };
        let Some(key) = parse_authorization(header) else {
            tracing::debug!("Authorization header is not '{} <token>'", KEYWORD);
            return Err(Error::Unauthenticated);
        };

        match self.registry.resolve(key).await? {
            Some(identity) => Ok(identity),
            None => {
                tracing::debug!("Invalid or expired token");
                Err(Error::Unauthenticated)
            }
        }
    }
}
