//! In-process store with optional JSON snapshot persistence.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::traits::{IdentityStore, NoteStore, StorageError, TokenStore};
use crate::model::{Identity, IdentityId, Note, NoteDraft, NoteId, NotePatch, TokenBinding};

const SNAPSHOT_FILE: &str = "store.json";

/// Identity, token and note tables behind a single lock.
///
/// Holding one `RwLock` over every table makes username uniqueness, token
/// get-or-create and owner-scoped read-modify-write atomic. When opened on a
/// directory, each mutation is applied to a copy of the tables, written out as
/// `store.json` (temp file + rename), and only then published, so a failed
/// write leaves both memory and disk at the previous state.
pub struct LocalStore {
    snapshot_path: Option<PathBuf>,
    tables: RwLock<Tables>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    identities: HashMap<IdentityId, Identity>,
    usernames: HashMap<String, IdentityId>,
    /// Maps token key -> binding
    tokens: HashMap<String, TokenBinding>,
    /// Maps identity -> token key
    token_keys: HashMap<IdentityId, String>,
    notes: BTreeMap<NoteId, Note>,
    last_note_id: i64,
}

/// On-disk shape. Lookup indexes are rebuilt on load.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    identities: Vec<Identity>,
    #[serde(default)]
    tokens: Vec<TokenBinding>,
    #[serde(default)]
    notes: Vec<Note>,
    #[serde(default)]
    last_note_id: i64,
}

impl From<&Tables> for Snapshot {
    fn from(tables: &Tables) -> Self {
        Self {
            identities: tables.identities.values().cloned().collect(),
            tokens: tables.tokens.values().cloned().collect(),
            notes: tables.notes.values().cloned().collect(),
            last_note_id: tables.last_note_id,
        }
    }
}

impl From<Snapshot> for Tables {
    fn from(snapshot: Snapshot) -> Self {
        let mut tables = Tables {
            last_note_id: snapshot.last_note_id,
            ..Tables::default()
        };
        for identity in snapshot.identities {
            tables.usernames.insert(identity.username.clone(), identity.id);
            tables.identities.insert(identity.id, identity);
        }
        for binding in snapshot.tokens {
            tables.token_keys.insert(binding.identity_id, binding.key.clone());
            tables.tokens.insert(binding.key.clone(), binding);
        }
        for note in snapshot.notes {
            tables.last_note_id = tables.last_note_id.max(note.id.0);
            tables.notes.insert(note.id, note);
        }
        tables
    }
}

impl LocalStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            snapshot_path: None,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Open (or create) a persistent store in `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let snapshot_path = data_dir.join(SNAPSHOT_FILE);
        let tables = if snapshot_path.exists() {
            let content = std::fs::read_to_string(&snapshot_path)?;
            let snapshot: Snapshot = serde_json::from_str(&content)?;
            let tables = Tables::from(snapshot);
            tracing::info!(
                "Loaded {} identities, {} tokens and {} notes from {:?}",
                tables.identities.len(),
                tables.tokens.len(),
                tables.notes.len(),
                snapshot_path
            );
            tables
        } else {
            tracing::info!("No store found at {:?}, starting empty", snapshot_path);
            Tables::default()
        };

        Ok(Self {
            snapshot_path: Some(snapshot_path),
            tables: RwLock::new(tables),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StorageError> {
        let tables = self.tables.read().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&tables))
    }

    /// Run a mutation under the write lock.
    ///
    /// `f` must check its preconditions before mutating. With persistence
    /// enabled the mutation runs on a copy that replaces the live tables only
    /// after the snapshot has been written.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut tables = self.tables.write().map_err(|_| StorageError::Poisoned)?;

        let Some(path) = &self.snapshot_path else {
            return f(&mut tables);
        };

        let mut staged = tables.clone();
        let out = f(&mut staged)?;
        let content = serde_json::to_string_pretty(&Snapshot::from(&staged))?;
        atomic_write(path, &content)?;
        *tables = staged;
        Ok(out)
    }
}

/// Write via temp file + rename so the snapshot is never half-written.
fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
    let suffix: [u8; 8] = rand::rng().random();
    let temp_path = path.with_extension(format!("{}.tmp", hex::encode(suffix)));

    if let Err(e) = std::fs::write(&temp_path, content) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

#[async_trait::async_trait]
impl IdentityStore for LocalStore {
    async fn insert_identity(&self, identity: Identity) -> Result<Identity, StorageError> {
        self.write(|tables| {
            if tables.usernames.contains_key(&identity.username) {
                return Err(StorageError::DuplicateUsername {
                    username: identity.username.clone(),
                });
            }
            tables.usernames.insert(identity.username.clone(), identity.id);
            tables.identities.insert(identity.id, identity.clone());
            Ok(identity)
        })
    }

    async fn identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StorageError> {
        self.read(|tables| {
            tables
                .usernames
                .get(username)
                .and_then(|id| tables.identities.get(id))
                .cloned()
        })
    }

    async fn identity_by_id(&self, id: IdentityId) -> Result<Option<Identity>, StorageError> {
        self.read(|tables| tables.identities.get(&id).cloned())
    }

    async fn delete_identity(&self, id: IdentityId) -> Result<bool, StorageError> {
        self.write(|tables| {
            let Some(identity) = tables.identities.remove(&id) else {
                return Ok(false);
            };
            tables.usernames.remove(&identity.username);
            if let Some(key) = tables.token_keys.remove(&id) {
                tables.tokens.remove(&key);
            }
            tables.notes.retain(|_, note| note.owner != id);
            Ok(true)
        })
    }
}

#[async_trait::async_trait]
impl TokenStore for LocalStore {
    async fn get_or_insert(
        &self,
        candidate: TokenBinding,
        now: DateTime<Utc>,
    ) -> Result<TokenBinding, StorageError> {
        // Fast path: a live binding needs no write (and no snapshot)
        let existing = self.read(|tables| {
            tables
                .token_keys
                .get(&candidate.identity_id)
                .and_then(|key| tables.tokens.get(key))
                .filter(|binding| !binding.is_expired(now))
                .cloned()
        })?;
        if let Some(binding) = existing {
            return Ok(binding);
        }

        self.write(|tables| {
            // Re-check under the write lock; another login may have won the race
            if let Some(binding) = tables
                .token_keys
                .get(&candidate.identity_id)
                .and_then(|key| tables.tokens.get(key))
                .filter(|binding| !binding.is_expired(now))
            {
                return Ok(binding.clone());
            }

            if !tables.identities.contains_key(&candidate.identity_id) {
                return Err(StorageError::UnknownIdentity(candidate.identity_id));
            }
            if tables.tokens.contains_key(&candidate.key) {
                return Err(StorageError::DuplicateToken);
            }

            if let Some(stale) = tables.token_keys.remove(&candidate.identity_id) {
                tables.tokens.remove(&stale);
            }
            tables
                .token_keys
                .insert(candidate.identity_id, candidate.key.clone());
            tables.tokens.insert(candidate.key.clone(), candidate.clone());
            Ok(candidate)
        })
    }

    async fn binding_by_key(&self, key: &str) -> Result<Option<TokenBinding>, StorageError> {
        self.read(|tables| tables.tokens.get(key).cloned())
    }

    async fn remove_binding(&self, identity: IdentityId) -> Result<bool, StorageError> {
        if !self.read(|tables| tables.token_keys.contains_key(&identity))? {
            return Ok(false);
        }
        self.write(|tables| match tables.token_keys.remove(&identity) {
            Some(key) => {
                tables.tokens.remove(&key);
                Ok(true)
            }
            None => Ok(false),
        })
    }
}

#[async_trait::async_trait]
impl NoteStore for LocalStore {
    async fn insert_note(
        &self,
        owner: IdentityId,
        draft: NoteDraft,
        now: DateTime<Utc>,
    ) -> Result<Note, StorageError> {
        self.write(|tables| {
            let id = NoteId(tables.last_note_id + 1);
            let note = Note {
                id,
                owner,
                title: draft.title,
                content: draft.content,
                created_at: now,
                updated_at: now,
            };
            tables.last_note_id = id.0;
            tables.notes.insert(id, note.clone());
            Ok(note)
        })
    }

    async fn notes_for_owner(&self, owner: IdentityId) -> Result<Vec<Note>, StorageError> {
        self.read(|tables| {
            tables
                .notes
                .values()
                .filter(|note| note.owner == owner)
                .cloned()
                .collect()
        })
    }

    async fn note_for_owner(
        &self,
        owner: IdentityId,
        id: NoteId,
    ) -> Result<Option<Note>, StorageError> {
        self.read(|tables| owned(&tables.notes, owner, id).cloned())
    }

    async fn update_note_for_owner(
        &self,
        owner: IdentityId,
        id: NoteId,
        patch: NotePatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Note>, StorageError> {
        if self.read(|tables| owned(&tables.notes, owner, id).is_none())? {
            return Ok(None);
        }
        self.write(|tables| {
            let Some(note) = tables.notes.get_mut(&id).filter(|note| note.owner == owner) else {
                return Ok(None);
            };
            patch.apply(note, now);
            Ok(Some(note.clone()))
        })
    }

    async fn delete_note_for_owner(
        &self,
        owner: IdentityId,
        id: NoteId,
    ) -> Result<bool, StorageError> {
        if self.read(|tables| owned(&tables.notes, owner, id).is_none())? {
            return Ok(false);
        }
        self.write(|tables| {
            if owned(&tables.notes, owner, id).is_none() {
                return Ok(false);
            }
            tables.notes.remove(&id);
            Ok(true)
        })
    }
}

/// Single owner-match lookup: foreign and missing notes both yield `None`.
fn owned(notes: &BTreeMap<NoteId, Note>, owner: IdentityId, id: NoteId) -> Option<&Note> {
    notes.get(&id).filter(|note| note.owner == owner)
}
