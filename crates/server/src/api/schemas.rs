use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use snote_core::{FieldError, PublicNote, encode_key_hash};

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[schema(example = "note does not exist")]
    pub error: String,
    /// Individual validation failures, present on `422` responses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(error: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

/// Request body for creating a note.
///
/// Provide either `expiresIn`, or both `expiresAt` and `expiresAtTimeZone`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateNoteRequest {
    /// Client-encrypted ciphertext, standard base64.
    #[serde(default)]
    #[schema(example = "U2FsdGVkX1+3q0cRkDsG1w==")]
    pub content: String,
    /// Lifetime in seconds, between 600 and 31536000.
    #[serde(default)]
    #[schema(example = 3600)]
    pub expires_in: Option<u64>,
    /// Absolute expiration time (RFC 3339).
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// IANA zone the absolute expiration was chosen in.
    #[serde(default)]
    #[schema(example = "Europe/Berlin")]
    pub expires_at_time_zone: Option<String>,
    /// Base58 hash of the encryption key (32 bytes).
    #[serde(default)]
    #[schema(example = "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi")]
    pub key_hash: String,
}

/// Response body for a created note. The content is not echoed back.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNoteResponse {
    /// Public identifier used to read the note.
    #[schema(example = "1111-1111-12")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Expiration time, rendered in the note's zone.
    pub expires_at: DateTime<FixedOffset>,
    #[schema(example = "UTC")]
    pub expires_at_time_zone: String,
    /// Key hash as 44 base58 symbols, the form expected on read.
    pub key_hash: String,
}

impl From<&PublicNote> for CreatedNoteResponse {
    fn from(note: &PublicNote) -> Self {
        Self {
            id: note.public_id.clone(),
            created_at: note.created_at,
            expires_at: note.local_expires_at().fixed_offset(),
            expires_at_time_zone: note.expires_at_time_zone.name().to_owned(),
            key_hash: encode_key_hash(&note.key_hash),
        }
    }
}

/// Response body for a note that was read (and destroyed).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    #[schema(example = "1111-1111-12")]
    pub id: String,
    /// Ciphertext, standard base64.
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Expiration time, rendered in the note's zone.
    pub expires_at: DateTime<FixedOffset>,
    #[schema(example = "UTC")]
    pub expires_at_time_zone: String,
    pub key_hash: String,
}

impl From<PublicNote> for NoteResponse {
    fn from(note: PublicNote) -> Self {
        Self {
            expires_at: note.local_expires_at().fixed_offset(),
            expires_at_time_zone: note.expires_at_time_zone.name().to_owned(),
            key_hash: encode_key_hash(&note.key_hash),
            content: BASE64.encode(&note.content),
            created_at: note.created_at,
            id: note.public_id,
        }
    }
}

/// Query parameters for reading a note.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GetNoteParams {
    /// Base58 key hash, exactly 44 symbols.
    #[serde(default)]
    pub key_hash: String,
}
