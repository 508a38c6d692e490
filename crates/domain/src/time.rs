//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// UTC timestamp used for message dates, call times and note edits.
///
/// Stores keep microsecond precision. A record saved with a finer date is
/// read back truncated to the microsecond, so compare stored dates against
/// [`now`] or a value already passed through [`to_storage`].
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time, at the microsecond precision stores keep.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp the way stores persist it (RFC 3339, microseconds).
#[must_use]
pub fn to_storage(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp previously rendered by [`to_storage`].
///
/// # Errors
///
/// Returns [`chrono::ParseError`] when `value` is not RFC 3339.
pub fn from_storage(value: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|ts| ts.to_utc())
}
