use async_trait::async_trait;
use chrono::{DateTime, Utc};

use snote_core::note::{NewNote, StoredNote};

use crate::error::RepositoryError;

/// Trait for persisting notes.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Persist a note. Storage assigns the numeric id.
    async fn create(&self, note: &NewNote) -> Result<StoredNote, RepositoryError>;

    /// Atomically read and remove a note.
    ///
    /// Returns [`RepositoryError::NotFound`] if the note does not exist or
    /// has expired. Of any number of concurrent calls for the same id, at
    /// most one succeeds.
    async fn get(&self, id: u64) -> Result<StoredNote, RepositoryError>;

    /// Remove every note that expired at or before `now`. Returns the number
    /// of notes removed.
    ///
    /// Backends that expire notes on their own can keep the default.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let _ = now;
        Ok(0)
    }
}
