//! The request pipeline.
//!
//! ```text
//! Exchange ─► ParsedUri ─► check_access ─► Dispatch ─► Engine ─┐
//!                              │              │          │      │ Ok
//!                              └──────────────┴──────────┘      │
//!                                  Err(Failure) ─► handle_failure
//!                                                               ▼
//!                                                        send_response
//! ```
//!
//! With a principal attached, everything from `check_access` to
//! `send_response` runs as a single unit inside the [`SecurityContext`].

use std::sync::Arc;

use chrono::Utc;
use http::header::{ACCESS_CONTROL_REQUEST_HEADERS, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::engine::{Engine, EngineResult};
use crate::error::{Error, Failure};
use crate::exchange::Exchange;
use crate::headers;
use crate::method::Dispatch;
use crate::origin::{first_header, origin, origin_or_referer};
use crate::response::send_response;
use crate::security::{SecurityContext, Unscoped};
use crate::uri::ParsedUri;

/// Adapts HTTP exchanges onto an [`Engine`].
///
/// Cheap to clone and safe to share across threads; all state is read-only.
#[derive(Clone)]
pub struct BridgeHandler {
    engine: Arc<dyn Engine>,
    config: Arc<Config>,
    security: Arc<dyn SecurityContext>,
}

impl BridgeHandler {
    pub fn new(engine: impl Engine, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
            security: Arc::new(Unscoped),
        }
    }

    /// Installs the subsystem used to run requests as their principal.
    pub fn with_security_context(mut self, security: impl SecurityContext) -> Self {
        self.security = Arc::new(security);
        self
    }

    pub fn config(&self) -> &Config { &self.config }

    /// Handles one exchange.
    ///
    /// Returns `Err` only for faults outside the JSON error path: failing to
    /// enter the principal's security scope, or failing to write the body.
    pub fn handle(&self, exchange: &mut Exchange) -> Result<(), Error> {
        let Some(principal) = exchange.principal().cloned() else {
            return self.do_handle(exchange);
        };
        self.security
            .run_as(&principal, Box::new(|| self.do_handle(exchange)))
            .map_err(|e| {
                error!(%principal, "cannot run request as principal: {e}");
                Error::from(e)
            })?
    }

    fn do_handle(&self, exchange: &mut Exchange) -> Result<(), Error> {
        let uri = ParsedUri::new(exchange.uri(), self.config.context_path());

        let result = match self.dispatch(exchange, &uri) {
            Ok(result) => {
                if self.config.debug() {
                    let shown = show_result(result.as_ref());
                    info!(path_info = uri.path_info(), "Response: {shown}");
                }
                result
            }
            Err(failure) => Some(self.translate(failure)),
        };

        send_response(exchange.response_mut(), &uri, &self.config, result.as_ref())
    }

    fn dispatch(&self, exchange: &mut Exchange, uri: &ParsedUri) -> EngineResult {
        let source = origin_or_referer(exchange.headers());
        self.engine.check_access(exchange.remote_addr(), source.as_deref())?;

        let dispatch = Dispatch::classify(exchange.method());
        debug!(%dispatch, path_info = uri.path_info(), peer = %exchange.remote_addr(), "dispatching");

        if dispatch.sets_policy_headers() {
            self.set_headers(exchange);
        }

        match dispatch {
            Dispatch::Read => {
                self.engine.handle_get(&uri.uri().to_string(), uri.path_info(), uri.parameters())
            }
            Dispatch::Write => {
                let charset = first_header(exchange.headers(), CONTENT_TYPE.as_str())
                    .and_then(|ct| self.config.request_charset(&ct));
                self.engine.handle_post(
                    &uri.uri().to_string(),
                    &mut exchange.body(),
                    charset.as_deref(),
                    uri.parameters(),
                )
            }
            Dispatch::Preflight => {
                self.preflight(exchange)?;
                Ok(None)
            }
            Dispatch::Unsupported(method) => Err(Failure::UnsupportedMethod(method)),
        }
    }

    fn set_headers(&self, exchange: &mut Exchange) {
        let allowed = self.engine.extract_cors_origin(origin(exchange.headers()).as_deref());
        let response = exchange.response_mut().headers_mut();
        headers::apply_no_cache_headers(response, Utc::now());
        headers::apply_cors_origin(response, allowed.as_deref());
    }

    fn preflight(&self, exchange: &mut Exchange) -> Result<(), Failure> {
        let request = exchange.headers();
        let pairs = self.engine.handle_cors_preflight(
            origin(request).as_deref(),
            first_header(request, ACCESS_CONTROL_REQUEST_HEADERS.as_str()).as_deref(),
        );
        headers::apply_pairs(exchange.response_mut().headers_mut(), pairs)
    }

    fn translate(&self, failure: Failure) -> Value {
        let cause = failure.into_cause();
        debug!("request failed: {cause}");
        self.engine.handle_failure(&cause)
    }
}

fn show_result(result: Option<&Value>) -> String {
    result.map_or_else(|| "null".to_owned(), Value::to_string)
}
