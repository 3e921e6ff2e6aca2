//! Mapping of core failures onto HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use notes_core::{Error, auth::KEYWORD};
use serde::Serialize;

/// `{"detail": "..."}` body used for every non-field error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Serialize)]
struct CredentialsError {
    non_field_errors: Vec<String>,
}

#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    /// Body could not be decoded into the expected request struct
    BadRequest(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn detail(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match self {
            ApiError::BadRequest(message) => return detail(StatusCode::BAD_REQUEST, message),
            ApiError::Core(error) => error,
        };

        match error {
            Error::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Error::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                Json(CredentialsError {
                    non_field_errors: vec!["Unable to log in with provided credentials.".to_string()],
                }),
            )
                .into_response(),
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, KEYWORD)],
                Json(ErrorBody {
                    detail: "Authentication credentials were not provided or are invalid."
                        .to_string(),
                }),
            )
                .into_response(),
            Error::NotFound => detail(StatusCode::NOT_FOUND, "Not found."),
            other @ (Error::PasswordHash(_) | Error::Storage(_)) => {
                tracing::error!("Request failed: {}", other);
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        }
    }
}
