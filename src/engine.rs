//! The request-processing engine the bridge adapts HTTP onto.
//!
//! The bridge knows nothing about management operations. It hands the engine
//! path-info, parameters or a body stream, and gets back a JSON value, the
//! "no content" sentinel (`None`), or a [`Failure`].

use std::io::Read;
use std::net::SocketAddr;

use serde_json::Value;

use crate::error::Failure;
use crate::uri::ParameterMap;

/// Outcome of a read or write call. `None` means there is nothing to send.
pub type EngineResult = Result<Option<Value>, Failure>;

/// External collaborator executing management requests.
///
/// Shared by every in-flight request, so implementations must be
/// `Send + Sync`. Calls are blocking; the bridge runs them on a blocking
/// worker thread.
pub trait Engine: Send + Sync + 'static {
    /// Checks whether the remote peer may use the bridge at all.
    /// `origin` is the sanitized `Origin` (or `Referer`) header.
    fn check_access(&self, remote: SocketAddr, origin: Option<&str>) -> Result<(), Failure>;

    /// Handles a `GET` request.
    fn handle_get(&self, uri: &str, path_info: &str, params: &ParameterMap) -> EngineResult;

    /// Handles a `POST` request. `charset` is `None` when the client did not
    /// declare one; the engine picks its own default then.
    fn handle_post(
        &self,
        uri: &str,
        body: &mut dyn Read,
        charset: Option<&str>,
        params: &ParameterMap,
    ) -> EngineResult;

    /// Computes the response headers for a CORS preflight request.
    fn handle_cors_preflight(
        &self,
        origin: Option<&str>,
        request_headers: Option<&str>,
    ) -> Vec<(String, String)>;

    /// Returns the origin to echo in `Access-Control-Allow-Origin`, or `None`
    /// if the CORS policy rejects it.
    fn extract_cors_origin(&self, origin: Option<&str>) -> Option<String>;

    /// Renders a failure as a JSON error payload.
    fn handle_failure(&self, failure: &Failure) -> Value;
}
