//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for motion stamps and beacon sightings.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whether `then` lies more than `ttl` before `now`.
///
/// A `then` in the future (clock moved backwards) is never expired.
#[must_use]
pub fn is_expired(then: Timestamp, now: Timestamp, ttl: std::time::Duration) -> bool {
    match (now - then).to_std() {
        Ok(age) => age > ttl,
        Err(_) => false,
    }
}
