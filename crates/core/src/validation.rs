//! Input validation for note creation and lookup.
//!
//! Every check runs independently and failures are collected, so a caller
//! sees the full list of problems in a single response.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::codec::{
    EXTENDED_PUBLIC_ID_LEN, KEY_HASH_ENCODED_LEN, PUBLIC_ID_LEN, has_public_id_shape, is_base58,
};
use crate::expiration::load_time_zone;
use crate::note::{
    CLOCK_SKEW_TOLERANCE, KEY_HASH_LEN, MAX_CONTENT_LEN, MAX_EXPIRES_IN, MIN_EXPIRES_AT_LEAD,
    MIN_EXPIRES_IN, NoteRequest,
};

/// Wire name of the content field.
pub const FIELD_CONTENT: &str = "content";
/// Wire name of the key hash field.
pub const FIELD_KEY_HASH: &str = "keyHash";
/// Wire name of the creation timestamp.
pub const FIELD_CREATED_AT: &str = "createdAt";
/// Wire name of the relative expiration.
pub const FIELD_EXPIRES_IN: &str = "expiresIn";
/// Wire name of the absolute expiration.
pub const FIELD_EXPIRES_AT: &str = "expiresAt";
/// Wire name of the expiration time zone.
pub const FIELD_EXPIRES_AT_TIME_ZONE: &str = "expiresAtTimeZone";
/// Wire name of the public identifier.
pub const FIELD_ID: &str = "id";

/// A single validation failure, optionally scoped to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Wire name of the offending field. Absent for failures that concern
    /// several fields at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    /// A failure scoped to `field`.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_owned()),
            message: message.into(),
        }
    }

    /// A failure not tied to one field.
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// An aggregated, non-empty list of validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", join(.0))]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Wrap a list of failures. Returns `None` when the list is empty.
    pub fn from_errors(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// The individual failures, in the order they were detected.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Consume and return the individual failures.
    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }

}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects failures from independent checks.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.errors.push(FieldError::field(field, message));
        }
    }

    /// Record a failure that is not tied to one field unless `ok` holds.
    pub fn check_general(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.errors.push(FieldError::general(message));
        }
    }

    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

/// Validate a note-creation request against the clock reading `now`.
///
/// Returns every failure found; an empty list means the request is valid.
pub fn validate_note(request: &NoteRequest, now: DateTime<Utc>) -> Vec<FieldError> {
    let mut v = Validator::new();

    v.check(
        !request.content.is_empty(),
        FIELD_CONTENT,
        "content must not be empty",
    );
    v.check(
        request.content.len() <= MAX_CONTENT_LEN,
        FIELD_CONTENT,
        format!("content must not exceed {MAX_CONTENT_LEN} bytes"),
    );
    v.check(
        request.key_hash.len() == KEY_HASH_LEN,
        FIELD_KEY_HASH,
        format!("key hash must be exactly {KEY_HASH_LEN} bytes"),
    );

    let earliest = now.checked_sub_signed(to_delta(CLOCK_SKEW_TOLERANCE));
    v.check(
        earliest.is_some_and(|earliest| request.created_at > earliest)
            && request.created_at <= now,
        FIELD_CREATED_AT,
        "creation time must lie within the last minute",
    );

    // expiresAt and its zone travel together.
    let has_at = request.expires_at.is_some();
    let has_zone = request
        .expires_at_time_zone
        .as_deref()
        .is_some_and(|zone| !zone.is_empty());
    if has_at != has_zone {
        let field = if has_at {
            FIELD_EXPIRES_AT_TIME_ZONE
        } else {
            FIELD_EXPIRES_AT
        };
        v.add(FieldError::field(
            field,
            "expiresAt and expiresAtTimeZone must be provided together",
        ));
    }

    let relative = request.relative_expiration();
    let absolute = request.absolute_expiration();
    v.check_general(
        relative.is_some() != absolute.is_some(),
        "either expiresIn or both expiresAt and expiresAtTimeZone should be provided",
    );

    if let Some(expires_in) = relative {
        v.check(
            (MIN_EXPIRES_IN..=MAX_EXPIRES_IN).contains(&expires_in),
            FIELD_EXPIRES_IN,
            "expiration must be between 10 minutes and 365 days",
        );
    }

    if let Some((expires_at, zone)) = absolute {
        check_absolute_expiration(&mut v, request.created_at, expires_at, zone);
    }

    v.into_errors()
}

fn check_absolute_expiration(
    v: &mut Validator,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    zone: &str,
) {
    let tz = match load_time_zone(zone) {
        Ok(tz) => tz,
        Err(e) => {
            v.add(FieldError::field(FIELD_EXPIRES_AT_TIME_ZONE, e.to_string()));
            return;
        }
    };

    let created_local = created_at.with_timezone(&tz);
    let expires_local = expires_at.with_timezone(&tz);
    let above_floor = created_local
        .checked_add_signed(to_delta(MIN_EXPIRES_AT_LEAD))
        .is_some_and(|floor| expires_local > floor);

    // The one-year ceiling is a calendar step in the note's own zone. Feb 29
    // clamps to Feb 28.
    let within_ceiling = created_local
        .checked_add_months(Months::new(12))
        .is_some_and(|ceiling| expires_local <= ceiling);

    v.check(
        above_floor && within_ceiling,
        FIELD_EXPIRES_AT,
        "expiration must be between 10 minutes and 1 year from now",
    );
}

/// Validate the format of a lookup: the public id and the encoded key hash
/// are checked independently.
pub fn validate_lookup(public_id: &str, key_hash: &str) -> Vec<FieldError> {
    let mut v = Validator::new();

    v.check(
        public_id.len() == PUBLIC_ID_LEN || public_id.len() == EXTENDED_PUBLIC_ID_LEN,
        FIELD_ID,
        format!("id should be {PUBLIC_ID_LEN} or {EXTENDED_PUBLIC_ID_LEN} characters long"),
    );
    v.check(
        has_public_id_shape(public_id),
        FIELD_ID,
        "id should consist of latin letters and digits grouped as XXXX-XXXX-XX",
    );
    v.check(
        key_hash.len() == KEY_HASH_ENCODED_LEN,
        FIELD_KEY_HASH,
        format!("key hash should consist of {KEY_HASH_ENCODED_LEN} letters and/or digits"),
    );
    v.check(
        is_base58(key_hash),
        FIELD_KEY_HASH,
        "key hash should consist of latin letters and/or digits",
    );

    v.into_errors()
}

fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}
