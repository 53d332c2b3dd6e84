//! # jmx-bridge
//!
//! The HTTP side of a JSON management bridge. Requests come in over HTTP,
//! get authorized, and are handed to an [`Engine`] that does the actual
//! management work. Whatever the engine answers, success or failure, goes
//! back to the client as JSON with `200 OK`.
//!
//! ## What the bridge owns
//!
//! - Method dispatch: `GET` reads, `POST` writes, `OPTIONS` is CORS preflight
//! - Access-control invocation before anything else runs
//! - CORS origin echo, cache suppression, `Date` / `Expires`
//! - Response MIME negotiation and JSONP callback wrapping
//! - Uniform failure-to-JSON translation
//!
//! ## What it does not
//!
//! How management operations work, how JSON requests are parsed, how access
//! decisions are made. Those belong to the [`Engine`] and the
//! [`SecurityContext`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use jmx_bridge::{BridgeHandler, Config, Server};
//! # use jmx_bridge::{Engine, EngineResult, Failure, ParameterMap};
//! # struct MyEngine;
//! # impl Engine for MyEngine {
//! #     fn check_access(&self, _: std::net::SocketAddr, _: Option<&str>) -> Result<(), Failure> { Ok(()) }
//! #     fn handle_get(&self, _: &str, _: &str, _: &ParameterMap) -> EngineResult { Ok(None) }
//! #     fn handle_post(&self, _: &str, _: &mut dyn std::io::Read, _: Option<&str>, _: &ParameterMap) -> EngineResult { Ok(None) }
//! #     fn handle_cors_preflight(&self, _: Option<&str>, _: Option<&str>) -> Vec<(String, String)> { vec![] }
//! #     fn extract_cors_origin(&self, o: Option<&str>) -> Option<String> { o.map(str::to_owned) }
//! #     fn handle_failure(&self, f: &Failure) -> serde_json::Value { serde_json::json!({"error": f.to_string()}) }
//! # }
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::builder().context_path("/jolokia").build();
//!     let bridge = BridgeHandler::new(MyEngine, config);
//!
//!     Server::bind("0.0.0.0:8778").serve(bridge).await.unwrap();
//! }
//! ```

mod config;
mod engine;
mod error;
mod exchange;
mod handler;
mod headers;
mod method;
mod origin;
mod response;
mod security;
mod server;
mod uri;

pub use config::{CALLBACK_PARAM, Config, ConfigBuilder, MIME_TYPE_PARAM, PATH_PARAM};
pub use engine::{Engine, EngineResult};
pub use error::{BoxError, Error, Failure, SecurityFailure};
pub use exchange::{BodyWriter, Exchange, ResponseSink};
pub use handler::BridgeHandler;
pub use headers::http_date;
pub use method::Dispatch;
pub use origin::{origin_or_referer, strip_line_breaks};
pub use response::{mime_type, render};
pub use security::{Principal, SecurityContext, Unit, Unscoped};
pub use server::{Authenticator, Server};
pub use uri::{ParameterMap, ParsedUri};
