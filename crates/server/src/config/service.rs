use std::time::Duration;

use serde::Deserialize;

/// Note service tuning.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceConfig {
    /// Deadline for each repository call, in milliseconds. Unset means no
    /// deadline.
    pub storage_timeout_ms: Option<u64>,
}

impl ServiceConfig {
    pub fn storage_timeout(&self) -> Option<Duration> {
        self.storage_timeout_ms.map(Duration::from_millis)
    }
}
