//! Minimal bridge demo with an in-memory engine.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:8778/jolokia/version
//!   curl 'http://localhost:8778/jolokia/read/demo:type=Counter/Value?callback=show'
//!   curl -X POST http://localhost:8778/jolokia/ \
//!        -H 'content-type: application/json; charset=utf-8' \
//!        -d '{"type":"read","mbean":"demo:type=Counter","attribute":"Value"}'
//!   curl -X PUT http://localhost:8778/jolokia/version
//!   curl -X OPTIONS http://localhost:8778/jolokia/ -H 'origin: http://localhost:3000'

use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use jmx_bridge::{BridgeHandler, Config, Engine, EngineResult, Failure, ParameterMap, Server};
use serde_json::{Value, json};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::builder()
        .context_path("/jolokia")
        .mime_type("application/json")
        .debug(true)
        .build();

    Server::bind("0.0.0.0:8778")
        .serve(BridgeHandler::new(DemoEngine::default(), config))
        .await
        .expect("server error");
}

/// Answers `version`, and reads of a single counter that goes up on every read.
#[derive(Default)]
struct DemoEngine {
    counter: AtomicU64,
}

impl DemoEngine {
    fn execute(&self, path_info: &str) -> EngineResult {
        let mut parts = path_info.trim_matches('/').split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("version"), _, _) => Ok(Some(json!({
                "status": 200,
                "value": { "agent": env!("CARGO_PKG_VERSION"), "protocol": "7.2" },
            }))),
            (Some("read"), Some("demo:type=Counter"), Some("Value")) => {
                let value = self.counter.fetch_add(1, Ordering::Relaxed);
                Ok(Some(json!({ "status": 200, "value": value })))
            }
            (Some("read"), Some(mbean), _) => {
                Err(Failure::management(Failure::engine(format!("no such MBean: {mbean}"))))
            }
            _ => Err(Failure::engine(format!("cannot handle '{path_info}'"))),
        }
    }
}

impl Engine for DemoEngine {
    fn check_access(&self, remote: SocketAddr, _origin: Option<&str>) -> Result<(), Failure> {
        if remote.ip().is_loopback() {
            Ok(())
        } else {
            Err(Failure::AccessDenied(format!("{} is not a local peer", remote.ip())))
        }
    }

    fn handle_get(&self, _uri: &str, path_info: &str, _params: &ParameterMap) -> EngineResult {
        self.execute(path_info)
    }

    fn handle_post(
        &self,
        _uri: &str,
        body: &mut dyn Read,
        _charset: Option<&str>,
        _params: &ParameterMap,
    ) -> EngineResult {
        let request: Value = serde_json::from_reader(body).map_err(Failure::engine)?;
        let kind = request["type"].as_str().unwrap_or_default();
        let mbean = request["mbean"].as_str().unwrap_or_default();
        let attribute = request["attribute"].as_str().unwrap_or_default();
        self.execute(&format!("{kind}/{mbean}/{attribute}"))
    }

    fn handle_cors_preflight(
        &self,
        origin: Option<&str>,
        request_headers: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut headers = vec![("Access-Control-Max-Age".to_owned(), "31536000".to_owned())];
        if let Some(origin) = origin {
            headers.push(("Access-Control-Allow-Origin".to_owned(), origin.to_owned()));
        }
        if let Some(requested) = request_headers {
            headers.push(("Access-Control-Allow-Headers".to_owned(), requested.to_owned()));
        }
        headers
    }

    fn extract_cors_origin(&self, origin: Option<&str>) -> Option<String> {
        origin.map(str::to_owned)
    }

    fn handle_failure(&self, failure: &Failure) -> Value {
        let status = match failure {
            Failure::AccessDenied(_) => 403,
            Failure::UnsupportedMethod(_) => 405,
            _ => 500,
        };
        json!({ "status": status, "error": failure.to_string() })
    }
}
