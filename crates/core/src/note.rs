use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Maximum size of a note's ciphertext (1 MiB).
pub const MAX_CONTENT_LEN: usize = 1_048_576;

/// Exact length of a key hash in bytes (SHA-256 digest size).
pub const KEY_HASH_LEN: usize = 32;

/// How far in the past a creation timestamp may lie.
pub const CLOCK_SKEW_TOLERANCE: Duration = Duration::from_secs(60);

/// Shortest allowed relative expiration.
pub const MIN_EXPIRES_IN: Duration = Duration::from_secs(10 * 60);

/// Longest allowed relative expiration.
pub const MAX_EXPIRES_IN: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Minimum lead of an absolute expiration over the creation time.
///
/// One minute shorter than [`MIN_EXPIRES_IN`]: absolute times arrive with
/// minute granularity.
pub const MIN_EXPIRES_AT_LEAD: Duration = Duration::from_secs(9 * 60);

/// Zone id stamped on notes created with a relative expiration.
pub const UTC_ZONE_ID: &str = "UTC";

/// Note-creation input, before validation and expiration resolution.
///
/// Exactly one expiration mode must be set: either `expires_in`, or both
/// `expires_at` and `expires_at_time_zone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRequest {
    /// Client-encrypted ciphertext, treated as an opaque blob.
    pub content: Vec<u8>,
    /// Creation timestamp, stamped by the server.
    pub created_at: DateTime<Utc>,
    /// Relative expiration.
    pub expires_in: Option<Duration>,
    /// Absolute expiration instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// IANA zone id the absolute expiration was chosen in.
    pub expires_at_time_zone: Option<String>,
    /// One-way hash of the client's key.
    pub key_hash: Vec<u8>,
}

impl NoteRequest {
    /// Create a request stamped with the current time and no expiration set.
    pub fn new(content: impl Into<Vec<u8>>, key_hash: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            created_at: Utc::now(),
            expires_in: None,
            expires_at: None,
            expires_at_time_zone: None,
            key_hash: key_hash.into(),
        }
    }

    /// Set a relative expiration.
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Set an absolute expiration chosen in the given zone.
    #[must_use]
    pub fn with_expires_at(
        mut self,
        expires_at: DateTime<Utc>,
        time_zone: impl Into<String>,
    ) -> Self {
        self.expires_at = Some(expires_at);
        self.expires_at_time_zone = Some(time_zone.into());
        self
    }

    /// The relative expiration, if set. A zero duration counts as unset.
    pub fn relative_expiration(&self) -> Option<Duration> {
        self.expires_in.filter(|d| !d.is_zero())
    }

    /// The absolute expiration and its zone id, if both are set.
    pub fn absolute_expiration(&self) -> Option<(DateTime<Utc>, &str)> {
        let zone = self
            .expires_at_time_zone
            .as_deref()
            .filter(|zone| !zone.is_empty())?;
        self.expires_at.map(|at| (at, zone))
    }
}

/// Repository input: a validated note with its expiration resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    /// Ciphertext.
    pub content: Vec<u8>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolved expiration instant.
    pub expires_at: DateTime<Utc>,
    /// IANA zone id for rendering `expires_at`.
    pub expires_at_time_zone: String,
    /// Key hash.
    pub key_hash: Vec<u8>,
}

/// A note as persisted by a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    /// Storage-assigned numeric id. Never shown to callers.
    pub id: u64,
    /// Ciphertext.
    pub content: Vec<u8>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiration instant (UTC).
    pub expires_at: DateTime<Utc>,
    /// IANA zone id, kept as a string until the point of use.
    pub expires_at_time_zone: String,
    /// Key hash.
    pub key_hash: Vec<u8>,
}

impl StoredNote {
    /// Returns `true` once `now` has reached the expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A note as returned to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicNote {
    /// Opaque public identifier.
    pub public_id: String,
    /// Ciphertext.
    pub content: Vec<u8>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiration instant (UTC).
    pub expires_at: DateTime<Utc>,
    /// Zone the expiration is rendered in.
    pub expires_at_time_zone: Tz,
    /// Key hash as supplied by the caller.
    pub key_hash: Vec<u8>,
}

impl PublicNote {
    /// Build a public note from a stored record.
    pub fn from_stored(public_id: String, note: StoredNote, time_zone: Tz) -> Self {
        Self {
            public_id,
            content: note.content,
            created_at: note.created_at,
            expires_at: note.expires_at,
            expires_at_time_zone: time_zone,
            key_hash: note.key_hash,
        }
    }

    /// The expiration instant in the note's own zone.
    pub fn local_expires_at(&self) -> DateTime<Tz> {
        self.expires_at.with_timezone(&self.expires_at_time_zone)
    }
}
