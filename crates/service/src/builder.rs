use std::sync::Arc;
use std::time::Duration;

use snote_core::{Base58IdCodec, IdCodec};
use snote_store::NoteRepository;

use crate::error::ServiceError;
use crate::service::NoteService;

/// Fluent builder for a [`NoteService`].
///
/// A repository is required. The codec defaults to [`Base58IdCodec`] and
/// repository calls run without a deadline unless one is set.
pub struct NoteServiceBuilder {
    repository: Option<Arc<dyn NoteRepository>>,
    codec: Arc<dyn IdCodec>,
    storage_timeout: Option<Duration>,
}

impl Default for NoteServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteServiceBuilder {
    pub fn new() -> Self {
        Self {
            repository: None,
            codec: Arc::new(Base58IdCodec),
            storage_timeout: None,
        }
    }

    /// Set the note repository.
    #[must_use]
    pub fn repository(mut self, repository: Arc<dyn NoteRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Replace the public identifier codec.
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn IdCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Bound every repository call by `timeout`.
    #[must_use]
    pub fn storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = Some(timeout);
        self
    }

    /// Consume the builder and produce a [`NoteService`].
    ///
    /// Returns [`ServiceError::Configuration`] if no repository was set or
    /// the storage timeout is zero.
    pub fn build(self) -> Result<NoteService, ServiceError> {
        let repository = self
            .repository
            .ok_or_else(|| ServiceError::Configuration("note repository is required".into()))?;

        if self.storage_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ServiceError::Configuration(
                "storage timeout must be greater than zero".into(),
            ));
        }

        Ok(NoteService {
            repository,
            codec: self.codec,
            storage_timeout: self.storage_timeout,
        })
    }
}
