//! Note endpoints. Every handler is scoped to the [`Caller`].

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use notes_core::{Error, IdentityId, Note, NoteId, NotePatch, notes::require_draft};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::Caller;
use crate::error::ApiError;

/// Note as returned to clients. `user` is output only.
#[derive(Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub user: IdentityId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            user: note.owner,
            created: note.created_at,
            updated: note.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteListResponse {
    pub count: usize,
    pub results: Vec<NoteResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
}

/// Note body for create/update/patch.
///
/// Owner fields sent by clients (`user`, ...) are not part of this struct
/// and are dropped during deserialization.
#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Unparseable ids cannot name one of the caller's notes.
fn note_id(raw: &str) -> Result<NoteId, ApiError> {
    raw.parse().map_err(|_| ApiError::Core(Error::NotFound))
}

/// Handler for `GET /api/notes/`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Query(params): Query<ListParams>,
) -> Result<Json<NoteListResponse>, ApiError> {
    let notes = state
        .service
        .list_notes(&identity, params.search.as_deref())
        .await?;

    Ok(Json(NoteListResponse {
        count: notes.len(),
        results: notes.into_iter().map(NoteResponse::from).collect(),
    }))
}

/// Handler for `POST /api/notes/`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    request: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let Json(request) = request?;
    let draft = require_draft(request.title, request.content)?;

    let note = state.service.create_note(&identity, draft).await?;

    Ok((StatusCode::CREATED, Json(note.into())))
}

/// Handler for `GET /api/notes/{id}/`
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note = state.service.get_note(&identity, note_id(&id)?).await?;
    Ok(Json(note.into()))
}

/// Handler for `PUT /api/notes/{id}/`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    request: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<Json<NoteResponse>, ApiError> {
    let id = note_id(&id)?;
    let Json(request) = request?;
    let draft = require_draft(request.title, request.content)?;

    let note = state.service.update_note(&identity, id, draft).await?;
    Ok(Json(note.into()))
}

/// Handler for `PATCH /api/notes/{id}/`
pub async fn partial_update(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    request: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<Json<NoteResponse>, ApiError> {
    let id = note_id(&id)?;
    let Json(request) = request?;
    let patch = NotePatch {
        title: request.title,
        content: request.content,
    };

    let note = state.service.patch_note(&identity, id, patch).await?;
    Ok(Json(note.into()))
}

/// Handler for `DELETE /api/notes/{id}/`
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_note(&identity, note_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
