//! Time and timestamp helpers.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_checked`, `last_render_at`, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// How long ago `earlier` was, relative to `now`.
///
/// Timestamps in the future (clock skew) count as zero age.
#[must_use]
pub fn age(earlier: Timestamp, now: Timestamp) -> Duration {
    (now - earlier).to_std().unwrap_or(Duration::ZERO)
}
