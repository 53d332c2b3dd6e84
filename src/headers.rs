//! Response header policy: CORS origin echo, cache suppression, dates.
//!
//! Applied to every read and write response before the engine runs, so the
//! headers are present even when the engine call ends in an error payload.

use chrono::{DateTime, Duration, Utc};
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, DATE, EXPIRES,
    PRAGMA,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::error::Failure;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Sets `Access-Control-Allow-Origin` and `Access-Control-Allow-Credentials`
/// when the CORS policy accepted an origin.
///
/// An accepted origin that cannot be written as a header value is skipped,
/// so the request goes on without CORS headers.
pub fn apply_cors_origin(headers: &mut HeaderMap, allowed: Option<&str>) {
    let Some(origin) = allowed else { return };
    match HeaderValue::try_from(origin) {
        Ok(value) => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        Err(_) => warn!(origin, "accepted origin is not a valid header value, not echoing it"),
    }
}

/// Sets `Cache-Control`, `Pragma`, `Date` and `Expires` relative to `now`.
///
/// `Expires` is one hour before `Date`. Some containers stamp their own
/// `Date` after ours, so a merely equal `Expires` can end up later than the
/// final `Date`.
pub fn apply_no_cache_headers(headers: &mut HeaderMap, now: DateTime<Utc>) {
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    set_date(headers, DATE, now);
    set_date(headers, EXPIRES, now - Duration::hours(1));
}

/// Formats `instant` as an RFC 1123 HTTP date in GMT.
pub fn http_date(instant: DateTime<Utc>) -> String {
    instant.format(HTTP_DATE_FORMAT).to_string()
}

/// Copies name/value pairs produced by the CORS preflight policy verbatim.
pub fn apply_pairs(headers: &mut HeaderMap, pairs: Vec<(String, String)>) -> Result<(), Failure> {
    for (name, value) in pairs {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|e| Failure::InvalidHeader(format!("{name}: {e}")))?;
        headers.insert(name, header_value(&value)?);
    }
    Ok(())
}

fn set_date(headers: &mut HeaderMap, name: HeaderName, instant: DateTime<Utc>) {
    // formatted dates are plain ASCII
    if let Ok(value) = HeaderValue::try_from(http_date(instant)) {
        headers.insert(name, value);
    }
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue, Failure> {
    HeaderValue::try_from(value).map_err(|e| Failure::InvalidHeader(format!("{value:?}: {e}")))
}
