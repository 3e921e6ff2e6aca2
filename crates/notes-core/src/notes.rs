//! Owner-scoped note repository.
//!
//! Every operation takes the caller's identity first and forwards it to the
//! store, which matches `(owner, id)` in a single lookup. A note owned by
//! someone else is therefore reported as [`Error::NotFound`], exactly like a
//! note that does not exist.

use std::sync::Arc;

use chrono::Utc;

use crate::config::SearchConfig;
use crate::error::{Error, FIELD_REQUIRED, FieldErrors, Result};
use crate::model::{Identity, Note, NoteDraft, NoteId, NotePatch};
use crate::search::SearchQuery;
use crate::storage::NoteStore;

pub const TITLE_MAX_CHARS: usize = 100;

const BLANK: &str = "This field may not be blank.";

pub struct NoteRepository {
    notes: Arc<dyn NoteStore>,
    search: SearchConfig,
}

impl NoteRepository {
    pub fn new(notes: Arc<dyn NoteStore>, search: SearchConfig) -> Self {
        Self { notes, search }
    }

    pub async fn list(&self, identity: &Identity) -> Result<Vec<Note>> {
        Ok(self.notes.notes_for_owner(identity.id).await?)
    }

    /// `list` filtered by a search query; `None` or blank returns everything.
    pub async fn search(&self, identity: &Identity, query: Option<&str>) -> Result<Vec<Note>> {
        let notes = self.list(identity).await?;
        match query {
            Some(raw) => Ok(SearchQuery::parse(raw, self.search.case_sensitive).filter(notes)),
            None => Ok(notes),
        }
    }

    pub async fn get(&self, identity: &Identity, id: NoteId) -> Result<Note> {
        self.notes
            .note_for_owner(identity.id, id)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Create a note owned by `identity`.
    pub async fn create(&self, identity: &Identity, draft: NoteDraft) -> Result<Note> {
        let draft = NoteDraft::new(draft.title.trim(), draft.content.trim());
        validate(&NotePatch::from(draft.clone()))?;
        let note = self.notes.insert_note(identity.id, draft, Utc::now()).await?;
        tracing::debug!("Created note {} for {}", note.id, identity.username);
        Ok(note)
    }

    /// Replace title and content.
    pub async fn update(&self, identity: &Identity, id: NoteId, draft: NoteDraft) -> Result<Note> {
        self.patch(identity, id, draft.into()).await
    }

    /// Change only the supplied fields.
    pub async fn patch(&self, identity: &Identity, id: NoteId, patch: NotePatch) -> Result<Note> {
        let patch = trimmed(patch);
        validate(&patch)?;
        let note = self
            .notes
            .update_note_for_owner(identity.id, id, patch, Utc::now())
            .await?
            .ok_or(Error::NotFound)?;
        tracing::debug!("Updated note {} for {}", note.id, identity.username);
        Ok(note)
    }

    pub async fn delete(&self, identity: &Identity, id: NoteId) -> Result<()> {
        if self.notes.delete_note_for_owner(identity.id, id).await? {
            tracing::debug!("Deleted note {} for {}", id, identity.username);
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }
}

/// Surrounding whitespace is not part of a note's fields.
fn trimmed(patch: NotePatch) -> NotePatch {
    NotePatch {
        title: patch.title.map(|title| title.trim().to_string()),
        content: patch.content.map(|content| content.trim().to_string()),
    }
}

/// Check the fields present in `patch`. Expects trimmed input.
fn validate(patch: &NotePatch) -> Result<()> {
    let mut errors = FieldErrors::default();

    if let Some(title) = &patch.title {
        if title.is_empty() {
            errors.push("title", BLANK);
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.push(
                "title",
                format!(
                    "Ensure this field has no more than {} characters.",
                    TITLE_MAX_CHARS
                ),
            );
        }
    }
    if let Some(content) = &patch.content {
        if content.is_empty() {
            errors.push("content", BLANK);
        }
    }

    errors.into_result()
}

/// Field errors for a draft whose fields may be absent from the request body.
pub fn require_draft(title: Option<String>, content: Option<String>) -> Result<NoteDraft> {
    let mut errors = FieldErrors::default();
    if title.is_none() {
        errors.push("title", FIELD_REQUIRED);
    }
    if content.is_none() {
        errors.push("content", FIELD_REQUIRED);
    }
    match (title, content) {
        (Some(title), Some(content)) => Ok(NoteDraft { title, content }),
        _ => Err(Error::Validation(errors)),
    }
}
