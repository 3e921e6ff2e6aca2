//! Caller resolution for protected routes.
//!
//! Handlers that take a [`Caller`] only run once the `Authorization` header
//! has resolved to an identity. Anything else is answered with 401 before the
//! request body is even read.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use notes_core::Identity;

use crate::AppState;
use crate::error::ApiError;

/// The authenticated identity making the request.
pub struct Caller(pub Identity);

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Non-UTF-8 header values are treated like a missing header
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let identity = state.service.authenticate_request(header).await?;
        Ok(Caller(identity))
    }
}
