//! Recording engine and exchange helpers shared by the integration tests.

#![allow(dead_code)]

use std::io::Read;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use jmx_bridge::{Engine, EngineResult, Exchange, Failure, ParameterMap};
use serde_json::{Value, json};

pub const PEER: &str = "10.0.0.7:50123";

/// What the engine answers to reads and writes.
#[derive(Clone)]
pub enum Reply {
    Value(Value),
    Nothing,
    Fail(fn() -> Failure),
}

#[derive(Debug, Default)]
pub struct Calls {
    pub access: Vec<(SocketAddr, Option<String>)>,
    pub gets: Vec<(String, String, ParameterMap)>,
    pub posts: Vec<(String, String, Option<String>, ParameterMap)>,
    pub preflights: Vec<(Option<String>, Option<String>)>,
    pub cors_origins: Vec<Option<String>>,
    pub failures: Vec<String>,
}

#[derive(Clone)]
pub struct RecordingEngine {
    pub calls: Arc<Mutex<Calls>>,
    pub reply: Reply,
    pub deny_access: bool,
    pub allowed_origin: Option<&'static str>,
    /// Returned from `extract_cors_origin` regardless of the request origin.
    pub forced_origin: Option<&'static str>,
    pub preflight_headers: Vec<(String, String)>,
}

impl RecordingEngine {
    pub fn replying(reply: Reply) -> Self {
        Self {
            calls: Arc::default(),
            reply,
            deny_access: false,
            allowed_origin: None,
            forced_origin: None,
            preflight_headers: Vec::new(),
        }
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }

    fn answer(&self) -> EngineResult {
        match &self.reply {
            Reply::Value(v) => Ok(Some(v.clone())),
            Reply::Nothing => Ok(None),
            Reply::Fail(f) => Err(f()),
        }
    }
}

impl Engine for RecordingEngine {
    fn check_access(&self, remote: SocketAddr, origin: Option<&str>) -> Result<(), Failure> {
        self.calls().access.push((remote, origin.map(str::to_owned)));
        if self.deny_access {
            return Err(Failure::AccessDenied(format!("{} is not allowed", remote.ip())));
        }
        Ok(())
    }

    fn handle_get(&self, uri: &str, path_info: &str, params: &ParameterMap) -> EngineResult {
        self.calls().gets.push((uri.to_owned(), path_info.to_owned(), params.clone()));
        self.answer()
    }

    fn handle_post(
        &self,
        uri: &str,
        body: &mut dyn Read,
        charset: Option<&str>,
        params: &ParameterMap,
    ) -> EngineResult {
        let mut text = String::new();
        body.read_to_string(&mut text).map_err(Failure::from)?;
        self.calls().posts.push((uri.to_owned(), text, charset.map(str::to_owned), params.clone()));
        self.answer()
    }

    fn handle_cors_preflight(
        &self,
        origin: Option<&str>,
        request_headers: Option<&str>,
    ) -> Vec<(String, String)> {
        self.calls()
            .preflights
            .push((origin.map(str::to_owned), request_headers.map(str::to_owned)));
        self.preflight_headers.clone()
    }

    fn extract_cors_origin(&self, origin: Option<&str>) -> Option<String> {
        self.calls().cors_origins.push(origin.map(str::to_owned));
        if let Some(forced) = self.forced_origin {
            return Some(forced.to_owned());
        }
        match (origin, self.allowed_origin) {
            (Some(o), Some(allowed)) if o == allowed => Some(o.to_owned()),
            _ => None,
        }
    }

    fn handle_failure(&self, failure: &Failure) -> Value {
        let kind = match failure {
            Failure::AccessDenied(_) => "AccessDenied",
            Failure::UnsupportedMethod(_) => "UnsupportedMethod",
            Failure::Management(_) => "Management",
            Failure::Engine(_) => "Engine",
            Failure::InvalidHeader(_) => "InvalidHeader",
            Failure::Io(_) => "Io",
        };
        self.calls().failures.push(kind.to_owned());
        json!({ "status": 500, "error_type": kind, "error": failure.to_string() })
    }
}

pub fn exchange(method: Method, uri: &str, headers: &[(&str, &str)], body: &str) -> Exchange {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    Exchange::new(
        method,
        uri.parse::<Uri>().unwrap(),
        map,
        PEER.parse().unwrap(),
        Bytes::from(body.to_owned()),
    )
}

pub fn body_json(exchange: &Exchange) -> Value {
    serde_json::from_slice(exchange.response().body()).unwrap()
}
