use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::note::UTC_ZONE_ID;

/// A canonical expiration: an absolute UTC instant plus the zone it should be
/// rendered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiration {
    pub expires_at: DateTime<Utc>,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpirationError {
    #[error("no expiration was provided")]
    Unset,

    #[error("expiration is out of the representable range")]
    OutOfRange,

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),
}

/// Reduce the two expiration modes to one canonical value.
///
/// A non-zero `expires_in` wins and is anchored at `now` in UTC. Otherwise
/// the absolute instant is kept together with its zone id.
pub fn resolve_expiration(
    expires_at: Option<DateTime<Utc>>,
    time_zone: Option<&str>,
    expires_in: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<Expiration, ExpirationError> {
    if let Some(expires_in) = expires_in.filter(|d| !d.is_zero()) {
        let delta = TimeDelta::from_std(expires_in).map_err(|_| ExpirationError::OutOfRange)?;
        let expires_at = now
            .checked_add_signed(delta)
            .ok_or(ExpirationError::OutOfRange)?;
        return Ok(Expiration {
            expires_at,
            time_zone: UTC_ZONE_ID.to_owned(),
        });
    }

    match (expires_at, time_zone.filter(|zone| !zone.is_empty())) {
        (Some(expires_at), Some(zone)) => Ok(Expiration {
            expires_at,
            time_zone: zone.to_owned(),
        }),
        _ => Err(ExpirationError::Unset),
    }
}

/// Parse an IANA zone id.
pub fn load_time_zone(zone: &str) -> Result<Tz, ExpirationError> {
    zone.parse::<Tz>()
        .map_err(|_| ExpirationError::UnknownTimeZone(zone.to_owned()))
}
