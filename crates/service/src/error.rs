use thiserror::Error;

use snote_core::ValidationErrors;
use snote_store::RepositoryError;

/// Errors returned by [`NoteService`](crate::NoteService) operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The input failed validation. Nothing was stored or consumed.
    #[error(transparent)]
    ValidationFailed(#[from] ValidationErrors),

    /// The note is missing, expired, already read, or the key hash did not
    /// match. Callers cannot tell these cases apart.
    #[error("note does not exist")]
    DoesNotExist,

    /// The repository failed.
    #[error("note {operation} failed: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: RepositoryError,
    },

    /// A stored record is inconsistent, e.g. its zone id does not parse.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The service was misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}
