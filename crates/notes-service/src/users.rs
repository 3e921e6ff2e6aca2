//! Registration, login, logout and account removal.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use notes_core::{Error, FieldErrors, Identity, IdentityId, error::FIELD_REQUIRED};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::Caller;
use crate::error::ApiError;

/// Registration request. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Public view of an identity. Never includes the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub id: IdentityId,
    pub username: String,
    pub email: String,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            email: identity.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Both fields present, or a field error for each one that is missing.
fn credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<(String, String), ApiError> {
    match (username, password) {
        (Some(username), Some(password)) => Ok((username, password)),
        (username, password) => {
            let mut errors = FieldErrors::default();
            if username.is_none() {
                errors.push("username", FIELD_REQUIRED);
            }
            if password.is_none() {
                errors.push("password", FIELD_REQUIRED);
            }
            Err(Error::Validation(errors).into())
        }
    }
}

/// Handler for `POST /api/register/`
pub async fn register(
    State(state): State<Arc<AppState>>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    let Json(request) = request?;
    let (username, password) = credentials(request.username, request.password)?;

    let identity = state
        .service
        .register(&username, &password, request.email.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(identity.into())))
}

/// Handler for `POST /api/login/`
pub async fn login(
    State(state): State<Arc<AppState>>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = request?;
    let (username, password) = credentials(request.username, request.password)?;

    let token = state.service.login(&username, &password).await?;

    Ok(Json(LoginResponse { token: token.0 }))
}

/// Handler for `POST /api/logout/`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<StatusCode, ApiError> {
    state.service.logout(&identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `DELETE /api/account/`
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<StatusCode, ApiError> {
    state.service.delete_identity(&identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
