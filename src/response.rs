//! Writing the final result onto the response sink.
//!
//! Every completed request ends here with `200 OK`, whether the result is a
//! success payload or a translated error. Error detail lives in the JSON,
//! never in the status line.

use std::io::Write;

use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use serde_json::Value;
use tracing::warn;

use crate::config::{CALLBACK_PARAM, Config, MIME_TYPE_PARAM};
use crate::error::Error;
use crate::exchange::ResponseSink;
use crate::uri::ParsedUri;

const JAVASCRIPT: &str = "text/javascript";
const PLAIN: &str = "text/plain";

/// Serializes `result` into `sink` and releases the body stream.
///
/// `None` is answered with an empty `text/plain` body. Otherwise the JSON is
/// wrapped as `callback(json);` when a JSONP callback was requested.
pub fn send_response(
    sink: &mut ResponseSink,
    uri: &ParsedUri,
    config: &Config,
    result: Option<&Value>,
) -> Result<(), Error> {
    let Some(json) = result else {
        sink.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(PLAIN));
        sink.send_headers(StatusCode::OK, 0)?;
        return Ok(());
    };

    let content_type = content_type(uri, config);
    sink.headers_mut().insert(CONTENT_TYPE, content_type);

    let body = render(&json.to_string(), uri.parameter(CALLBACK_PARAM)).into_bytes();
    sink.send_headers(StatusCode::OK, body.len())?;

    // the writer closes the sink on drop, also when write_all fails
    let mut out = sink.writer()?;
    out.write_all(&body)?;
    Ok(())
}

/// Wraps `json` in a JSONP call if `callback` is set.
pub fn render(json: &str, callback: Option<&str>) -> String {
    match callback {
        Some(callback) => format!("{callback}({json});"),
        None => json.to_owned(),
    }
}

/// Response MIME type: `text/javascript` for JSONP, else the `mimeType`
/// parameter, else the configured default.
pub fn mime_type<'a>(uri: &'a ParsedUri, config: &'a Config) -> &'a str {
    if uri.parameter(CALLBACK_PARAM).is_some() {
        JAVASCRIPT
    } else {
        uri.parameter(MIME_TYPE_PARAM).unwrap_or(config.mime_type())
    }
}

fn content_type(uri: &ParsedUri, config: &Config) -> HeaderValue {
    let requested = format!("{}; charset=utf-8", mime_type(uri, config));
    HeaderValue::try_from(requested.as_str()).unwrap_or_else(|_| {
        warn!(mime_type = %requested, "unusable mime type requested, using default");
        HeaderValue::try_from(format!("{}; charset=utf-8", config.mime_type()))
            .unwrap_or_else(|_| HeaderValue::from_static("text/plain; charset=utf-8"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(uri: &str) -> ParsedUri {
        ParsedUri::new(&uri.parse().unwrap(), "/j/")
    }

    #[test]
    fn no_result_is_empty_plain_text() {
        let mut sink = ResponseSink::default();
        send_response(&mut sink, &parsed("/j/version"), &Config::default(), None).unwrap();
        assert_eq!(sink.status(), Some(StatusCode::OK));
        assert_eq!(sink.headers()[CONTENT_TYPE], "text/plain");
        assert!(sink.body().is_empty());
        assert!(sink.is_closed());
    }

    #[test]
    fn json_result_uses_default_mime_type() {
        let mut sink = ResponseSink::default();
        let value = json!({"status": 200});
        send_response(&mut sink, &parsed("/j/version"), &Config::default(), Some(&value)).unwrap();
        assert_eq!(sink.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(sink.body(), br#"{"status":200}"#);
        assert!(sink.is_closed());
    }

    #[test]
    fn callback_wraps_body_and_forces_javascript() {
        let mut sink = ResponseSink::default();
        let value = json!({"value": 1});
        let uri = parsed("/j/read?callback=cb&mimeType=application/json");
        send_response(&mut sink, &uri, &Config::default(), Some(&value)).unwrap();
        assert_eq!(sink.headers()[CONTENT_TYPE], "text/javascript; charset=utf-8");
        assert_eq!(sink.body(), br#"cb({"value":1});"#);
    }

    #[test]
    fn mime_type_parameter_overrides_config() {
        let config = Config::builder().mime_type("application/json").build();
        assert_eq!(mime_type(&parsed("/j/read"), &config), "application/json");
        assert_eq!(mime_type(&parsed("/j/read?mimeType=text/plain"), &config), "text/plain");
    }

    #[test]
    fn content_length_counts_utf8_bytes() {
        let mut sink = ResponseSink::default();
        let value = json!({"name": "Grüße"});
        send_response(&mut sink, &parsed("/j/read"), &Config::default(), Some(&value)).unwrap();
        assert_eq!(std::str::from_utf8(sink.body()).unwrap(), r#"{"name":"Grüße"}"#);
        assert_eq!(sink.body().len(), r#"{"name":"Grüße"}"#.len());
    }

    #[test]
    fn render_without_callback_is_identity() {
        assert_eq!(render("[1,2]", None), "[1,2]");
        assert_eq!(render("[1,2]", Some("fn")), "fn([1,2]);");
    }
}
