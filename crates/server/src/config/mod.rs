mod logging;
mod server;
mod service;
mod store;


pub use logging::*;
pub use server::*;
pub use service::*;
pub use store::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Lowest port the server agrees to bind.
pub const MIN_PORT: u16 = 1024;

/// Top-level configuration for the snote server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct SnoteConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Note store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Note service tuning.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SnoteConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.server.port < MIN_PORT {
            return Err(ServerError::Config(format!(
                "invalid port value {}. Should be in-between {MIN_PORT} and {}",
                self.server.port,
                u16::MAX
            )));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ServerError::Config(
                "max_body_bytes must be greater than zero".into(),
            ));
        }

        if !SUPPORTED_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(ServerError::Config(format!(
                "unknown store backend: {} (expected one of: {})",
                self.store.backend,
                SUPPORTED_BACKENDS.join(", ")
            )));
        }

        if self.service.storage_timeout_ms == Some(0) {
            return Err(ServerError::Config(
                "storage_timeout_ms must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
