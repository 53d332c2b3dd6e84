//! Request URI parsing: mount-prefix stripping and query decoding.

use std::borrow::Cow;
use std::collections::BTreeMap;

use http::Uri;
use url::form_urlencoded;

use crate::config::PATH_PARAM;

/// Decoded query parameters. Keys are unique; a key repeated in the query
/// string collects all of its values in order.
pub type ParameterMap = BTreeMap<String, Vec<String>>;

/// A request URI split into path-info and parameters.
#[derive(Clone, Debug)]
pub struct ParsedUri {
    uri: Uri,
    path_info: String,
    parameters: ParameterMap,
}

impl ParsedUri {
    /// Parses `uri` relative to the mount prefix `context_path`.
    ///
    /// A path outside the prefix is kept whole; deciding what to do with it
    /// is the engine's business. A `p` query parameter overrides the
    /// path-info taken from the URI path.
    pub fn new(uri: &Uri, context_path: &str) -> Self {
        let parameters = parse_query(uri.query().unwrap_or(""));

        let path_info = match parameters.get(PATH_PARAM).and_then(|v| v.first()) {
            Some(p) => p.strip_prefix('/').unwrap_or(p.as_str()).to_owned(),
            None => {
                let path = decode_path(uri.path());
                path.strip_prefix(context_path).unwrap_or(&*path).to_owned()
            }
        };

        Self { uri: uri.clone(), path_info, parameters }
    }

    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path_info(&self) -> &str { &self.path_info }
    pub fn parameters(&self) -> &ParameterMap { &self.parameters }

    /// First value of a query parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name)?.first().map(String::as_str)
    }
}

fn parse_query(query: &str) -> ParameterMap {
    let mut params = ParameterMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    params
}

fn decode_path(path: &str) -> Cow<'_, str> {
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(uri: &str, prefix: &str) -> ParsedUri {
        ParsedUri::new(&uri.parse().unwrap(), prefix)
    }

    #[test]
    fn strips_mount_prefix_and_reads_callback() {
        let parsed = parse("/base/read/java.lang:type=Memory/HeapMemoryUsage?callback=cb", "/base/");
        assert_eq!(parsed.path_info(), "read/java.lang:type=Memory/HeapMemoryUsage");
        assert_eq!(parsed.parameters().len(), 1);
        assert_eq!(parsed.parameter("callback"), Some("cb"));
    }

    #[test]
    fn path_outside_prefix_is_tolerated() {
        let parsed = parse("/other/version", "/base/");
        assert_eq!(parsed.path_info(), "/other/version");
    }

    #[test]
    fn repeated_keys_collect_values() {
        let parsed = parse("/j/list?a=1&b=2&a=3", "/j/");
        assert_eq!(parsed.parameters()["a"], vec!["1", "3"]);
        assert_eq!(parsed.parameter("a"), Some("1"));
        assert_eq!(parsed.parameter("missing"), None);
    }

    #[test]
    fn query_values_are_form_decoded() {
        let parsed = parse("/j/read?mimeType=application%2Fjson&x=a+b", "/j/");
        assert_eq!(parsed.parameter("mimeType"), Some("application/json"));
        assert_eq!(parsed.parameter("x"), Some("a b"));
    }

    #[test]
    fn path_is_percent_decoded() {
        let parsed = parse("/j/read/java.lang%3Atype%3DMemory", "/j/");
        assert_eq!(parsed.path_info(), "read/java.lang:type=Memory");
    }

    #[test]
    fn path_parameter_overrides_uri_path() {
        let parsed = parse("/j/?p=/read/java.lang:type=Runtime/Uptime", "/j/");
        assert_eq!(parsed.path_info(), "read/java.lang:type=Runtime/Uptime");
    }

    #[test]
    fn no_query_means_no_parameters() {
        let parsed = parse("/j/version", "/j/");
        assert!(parsed.parameters().is_empty());
        assert_eq!(parsed.uri().path(), "/j/version");
    }
}
