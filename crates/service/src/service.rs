use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use snote_core::validation::{FIELD_EXPIRES_AT_TIME_ZONE, FIELD_EXPIRES_IN};
use snote_core::{
    ExpirationError, FieldError, IdCodec, KEY_HASH_LEN, NewNote, NoteRequest, PublicNote,
    ValidationErrors, decode_key_hash, is_authorized, load_time_zone, resolve_expiration,
    validate_lookup, validate_note,
};
use snote_store::{NoteRepository, RepositoryError};

use crate::builder::NoteServiceBuilder;
use crate::error::ServiceError;

/// Creates notes and hands each one out at most once.
///
/// Read pipeline for each lookup:
/// 1. Check the format of the public id and key hash.
/// 2. Decode both, remembering failures instead of returning early.
/// 3. Consume the note from the repository.
/// 4. Compare key hashes in constant time.
/// 5. Parse the stored zone id of a found note; a bad one is an
///    [`ServiceError::Integrity`] failure whatever the key.
/// 6. Collapse every other failure into [`ServiceError::DoesNotExist`].
pub struct NoteService {
    pub(crate) repository: Arc<dyn NoteRepository>,
    pub(crate) codec: Arc<dyn IdCodec>,
    pub(crate) storage_timeout: Option<Duration>,
}

impl std::fmt::Debug for NoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteService")
            .field("storage_timeout", &self.storage_timeout)
            .finish_non_exhaustive()
    }
}

impl NoteService {
    pub fn builder() -> NoteServiceBuilder {
        NoteServiceBuilder::new()
    }

    /// Validate and persist a note.
    ///
    /// The returned note carries the public id and the resolved expiration.
    #[instrument(skip_all)]
    pub async fn create_note(&self, request: NoteRequest) -> Result<PublicNote, ServiceError> {
        let now = Utc::now();

        if let Some(errors) = ValidationErrors::from_errors(validate_note(&request, now)) {
            debug!(failures = errors.errors().len(), "note rejected by validation");
            return Err(ServiceError::ValidationFailed(errors));
        }

        let expiration = resolve_expiration(
            request.expires_at,
            request.expires_at_time_zone.as_deref(),
            request.relative_expiration(),
            now,
        )
        .map_err(expiration_failure)?;

        let new_note = NewNote {
            content: request.content,
            created_at: request.created_at,
            expires_at: expiration.expires_at,
            expires_at_time_zone: expiration.time_zone,
            key_hash: request.key_hash,
        };

        let stored = self
            .with_deadline(self.repository.create(&new_note))
            .await
            .map_err(|source| storage_failure("create", source))?;

        let time_zone = load_time_zone(&stored.expires_at_time_zone).map_err(|e| {
            error!(id = stored.id, error = %e, "created note has an invalid time zone");
            ServiceError::Integrity("note has invalid time zone".into())
        })?;

        let public_id = self.codec.encode(stored.id);
        info!(
            id = stored.id,
            expires_at = %stored.expires_at,
            time_zone = %stored.expires_at_time_zone,
            "note created"
        );

        Ok(PublicNote::from_stored(public_id, stored, time_zone))
    }

    /// Read a note and destroy it in the same step.
    ///
    /// Missing, expired and already-read notes, and notes requested with the
    /// wrong key hash, all yield [`ServiceError::DoesNotExist`]. A note
    /// requested with the wrong key hash is consumed all the same.
    #[instrument(skip(self, key_hash))]
    pub async fn get_note(
        &self,
        public_id: &str,
        key_hash: &str,
    ) -> Result<PublicNote, ServiceError> {
        if let Some(errors) = ValidationErrors::from_errors(validate_lookup(public_id, key_hash)) {
            return Err(ServiceError::ValidationFailed(errors));
        }

        let mut failed = false;

        let id = match self.codec.decode(public_id) {
            Ok(id) => id,
            Err(_) => {
                failed = true;
                0
            }
        };

        let supplied = match decode_key_hash(key_hash) {
            Ok(bytes) if bytes.len() == KEY_HASH_LEN => bytes,
            _ => {
                failed = true;
                vec![0; KEY_HASH_LEN]
            }
        };

        let found = match self.with_deadline(self.repository.get(id)).await {
            Ok(note) => Some(note),
            Err(RepositoryError::NotFound(_)) => {
                failed = true;
                None
            }
            Err(source) => return Err(storage_failure("get", source)),
        };

        // Nothing found: the supplied hash is compared with itself.
        let expected = found
            .as_ref()
            .map_or(supplied.as_slice(), |note| note.key_hash.as_slice());
        let authorized = is_authorized(&supplied, expected);

        let time_zone = match &found {
            Some(note) => Some(load_time_zone(&note.expires_at_time_zone).map_err(|e| {
                error!(id = note.id, error = %e, "stored note has an invalid time zone");
                ServiceError::Integrity("note has invalid time zone".into())
            })?),
            None => None,
        };

        let (note, time_zone) = match (found, time_zone) {
            (Some(note), Some(time_zone)) if authorized && !failed => (note, time_zone),
            _ => return Err(ServiceError::DoesNotExist),
        };

        info!(id = note.id, "note consumed");

        Ok(PublicNote {
            public_id: public_id.to_owned(),
            content: note.content,
            created_at: note.created_at,
            expires_at: note.expires_at,
            expires_at_time_zone: time_zone,
            key_hash: supplied,
        })
    }

    /// Remove expired notes. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, ServiceError> {
        self.with_deadline(self.repository.purge_expired(Utc::now()))
            .await
            .map_err(|source| storage_failure("purge", source))
    }

    /// Run a repository call under the configured deadline, if any.
    async fn with_deadline<T, F>(&self, call: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        match self.storage_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| RepositoryError::Timeout(limit))?,
            None => call.await,
        }
    }
}

fn storage_failure(operation: &'static str, source: RepositoryError) -> ServiceError {
    warn!(operation, error = %source, "note repository call failed");
    ServiceError::Storage { operation, source }
}

fn expiration_failure(err: ExpirationError) -> ServiceError {
    let failure = match &err {
        ExpirationError::Unset => FieldError::general(err.to_string()),
        ExpirationError::OutOfRange => FieldError::field(FIELD_EXPIRES_IN, err.to_string()),
        ExpirationError::UnknownTimeZone(_) => {
            FieldError::field(FIELD_EXPIRES_AT_TIME_ZONE, err.to_string())
        }
    };
    ServiceError::ValidationFailed(failure.into())
}
