//! notes-service: HTTP routing layer over `notes-core`.
//!
//! Exposed as a library so integration tests can drive the router directly.

pub mod auth;
pub mod config;
pub mod error;
pub mod notes;
pub mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use notes_core::NotesService;
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub service: NotesService,
}

impl AppState {
    pub fn new(service: NotesService) -> Arc<Self> {
        Arc::new(Self { service })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Identities
        .route("/api/register/", post(users::register))
        .route("/api/login/", post(users::login))
        .route("/api/logout/", post(users::logout))
        .route("/api/account/", delete(users::delete_account))
        // Notes
        .route("/api/notes/", get(notes::list).post(notes::create))
        .route(
            "/api/notes/{id}/",
            get(notes::retrieve)
                .put(notes::update)
                .patch(notes::partial_update)
                .delete(notes::destroy),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
