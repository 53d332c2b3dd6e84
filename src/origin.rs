//! Cross-origin source extraction.

use http::HeaderMap;
use http::header::{ORIGIN, REFERER};

/// The `Origin` header, falling back to `Referer`, with CR/LF removed.
///
/// Used for the access-control check, which wants to know where a browser
/// request came from even when the browser did not send `Origin`.
pub fn origin_or_referer(headers: &HeaderMap) -> Option<String> {
    first_header(headers, ORIGIN.as_str())
        .or_else(|| first_header(headers, REFERER.as_str()))
        .map(|value| strip_line_breaks(&value))
}

/// The `Origin` header alone, with CR/LF removed.
pub fn origin(headers: &HeaderMap) -> Option<String> {
    first_header(headers, ORIGIN.as_str()).map(|value| strip_line_breaks(&value))
}

/// Removes every `\r` and `\n` so the value can never split a header line.
pub fn strip_line_breaks(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

/// First value of `name`. Header bytes are read as ISO-8859-1, one byte per
/// character, so no input is rejected or replaced.
pub(crate) fn first_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| v.as_bytes().iter().map(|&b| char::from(b)).collect())
}
