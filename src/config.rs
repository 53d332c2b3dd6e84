//! Process-wide bridge configuration.
//!
//! Built once at startup, then shared read-only by every request. Nothing in
//! here is ever mutated after [`ConfigBuilder::build`], so no locking is needed.

use regex::Regex;

/// Query parameter naming a JSONP callback.
pub const CALLBACK_PARAM: &str = "callback";
/// Query parameter overriding the response MIME type.
pub const MIME_TYPE_PARAM: &str = "mimeType";
/// Query parameter overriding the path-info taken from the URI path.
pub const PATH_PARAM: &str = "p";

const DEFAULT_CONTEXT_PATH: &str = "/jolokia";
const DEFAULT_MIME_TYPE: &str = "text/plain";
const CHARSET_PATTERN: &str = r"^.*;\s*charset=([^;,]+)\s*.*$";

/// Immutable bridge configuration.
#[derive(Clone, Debug)]
pub struct Config {
    context_path: String,
    mime_type: String,
    debug: bool,
    charset: Regex,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            context_path: DEFAULT_CONTEXT_PATH.to_owned(),
            mime_type: DEFAULT_MIME_TYPE.to_owned(),
            debug: false,
        }
    }

    /// The mount prefix. Always ends with exactly one `/`.
    pub fn context_path(&self) -> &str { &self.context_path }

    /// MIME type used when neither a callback nor a `mimeType` parameter is given.
    pub fn mime_type(&self) -> &str { &self.mime_type }

    pub fn debug(&self) -> bool { self.debug }

    /// Extracts the `charset=` token from a `Content-Type` header value.
    ///
    /// The pattern must match the whole value and its leading `.*` is greedy,
    /// so when several `charset=` parameters are present the last one wins.
    pub fn request_charset(&self, content_type: &str) -> Option<String> {
        self.charset
            .captures(content_type)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end().to_owned())
    }
}

impl Default for Config {
    fn default() -> Self { Self::builder().build() }
}

/// Fluent builder for [`Config`]. Obtain via [`Config::builder()`].
pub struct ConfigBuilder {
    context_path: String,
    mime_type: String,
    debug: bool,
}

impl ConfigBuilder {
    pub fn context_path(mut self, path: impl Into<String>) -> Self {
        self.context_path = path.into();
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn build(self) -> Config {
        Config {
            context_path: normalize_context_path(&self.context_path),
            mime_type: self.mime_type,
            debug: self.debug,
            charset: Regex::new(CHARSET_PATTERN).expect("charset pattern is valid"),
        }
    }
}

/// Ensures the prefix ends in exactly one `/`. Idempotent.
pub fn normalize_context_path(path: &str) -> String {
    let mut normalized = path.trim_end_matches('/').to_owned();
    normalized.push('/');
    normalized
}
