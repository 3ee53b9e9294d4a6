use thiserror::Error;

/// Errors from note repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("note not found: {0}")]
    NotFound(u64),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl RepositoryError {
    /// Returns `true` for the absence outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
