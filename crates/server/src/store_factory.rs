use std::sync::Arc;

use snote_store::NoteRepository;
use snote_store_memory::MemoryNoteRepository;
#[cfg(feature = "postgres")]
use snote_store_postgres::{PostgresConfig, PostgresNoteRepository};

use crate::config::StoreConfig;
use crate::error::ServerError;

/// Construct a [`NoteRepository`] from configuration.
pub async fn create_repository(
    config: &StoreConfig,
) -> Result<Arc<dyn NoteRepository>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryNoteRepository::new())),
        #[cfg(feature = "postgres")]
        "postgres" => create_postgres(config).await,
        other => Err(ServerError::Config(format!(
            "unsupported store backend: {other} (is the feature enabled?)"
        ))),
    }
}

#[cfg(feature = "postgres")]
async fn create_postgres(config: &StoreConfig) -> Result<Arc<dyn NoteRepository>, ServerError> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| ServerError::Config("postgres backend requires 'url' in [store]".into()))?;
    let defaults = PostgresConfig::default();
    let pg_config = PostgresConfig {
        url: url.to_owned(),
        pool_size: config.pool_size.unwrap_or(defaults.pool_size),
        table_prefix: config.prefix.clone().unwrap_or(defaults.table_prefix),
        schema: defaults.schema,
    };
    let repository = PostgresNoteRepository::new(pg_config)
        .await
        .map_err(|e| ServerError::Config(format!("postgres store: {e}")))?;
    Ok(Arc::new(repository))
}
