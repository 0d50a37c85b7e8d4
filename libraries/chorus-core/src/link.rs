//! Stream address expiry
//!
//! Stream addresses handed out by the resolver are time-limited and carry
//! their own expiry as an `expire=<unix seconds>` query parameter. An address
//! is treated as expired a safety margin before that instant so a stream is
//! never started on a link that dies mid-track.

use chrono::{DateTime, Duration, TimeZone, Utc};
use url::Url;

/// Query parameter carrying the unix expiry timestamp
pub const EXPIRY_PARAM: &str = "expire";

/// How long before the nominal expiry an address stops being used, in seconds
pub const EXPIRY_MARGIN_SECS: i64 = 30 * 60;

/// Nominal expiry embedded in a stream address, if any
pub fn expires_at(address: &str) -> Option<DateTime<Utc>> {
    let url = Url::parse(address).ok()?;
    let (_, value) = url.query_pairs().find(|(key, _)| key == EXPIRY_PARAM)?;
    let seconds = value.parse::<i64>().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}

/// Whether `address` must be refreshed before playback at `now`
///
/// Addresses without an embedded expiry never expire.
pub fn is_expired(address: &str, now: DateTime<Utc>) -> bool {
    expires_at(address).is_some_and(|expiry| now > expiry - Duration::seconds(EXPIRY_MARGIN_SECS))
}
