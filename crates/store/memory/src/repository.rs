use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use snote_core::note::{NewNote, StoredNote};
use snote_store::error::RepositoryError;
use snote_store::repository::NoteRepository;

/// In-memory [`NoteRepository`] backed by a [`DashMap`].
///
/// Reads remove the entry in the same map operation, so a note is handed
/// out at most once. Expired notes are dropped when read or purged.
#[derive(Debug)]
pub struct MemoryNoteRepository {
    notes: DashMap<u64, StoredNote>,
    next_id: AtomicU64,
}

impl Default for MemoryNoteRepository {
    fn default() -> Self {
        Self {
            notes: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryNoteRepository {
    /// Create a new, empty repository. Ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn create(&self, note: &NewNote) -> Result<StoredNote, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = StoredNote {
            id,
            content: note.content.clone(),
            created_at: note.created_at,
            expires_at: note.expires_at,
            expires_at_time_zone: note.expires_at_time_zone.clone(),
            key_hash: note.key_hash.clone(),
        };
        self.notes.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: u64) -> Result<StoredNote, RepositoryError> {
        let (_, note) = self
            .notes
            .remove(&id)
            .ok_or(RepositoryError::NotFound(id))?;

        if note.is_expired_at(Utc::now()) {
            tracing::debug!(id, "dropped expired note on read");
            return Err(RepositoryError::NotFound(id));
        }
        Ok(note)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut purged = 0u64;
        self.notes.retain(|_, note| {
            let expired = note.is_expired_at(now);
            if expired {
                purged += 1;
            }
            !expired
        });
        Ok(purged)
    }
}
