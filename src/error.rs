//! Failure and fault types.
//!
//! Two layers:
//!
//! - [`Failure`] is anything that goes wrong while producing a result for one
//!   request. The handler catches every `Failure` and lets the engine turn it
//!   into a JSON error payload sent with `200 OK`.
//! - [`Error`] is a fault in the housekeeping around that boundary (entering a
//!   principal's security scope, writing the response bytes, talking to the
//!   socket). It is never rendered as JSON; it escapes to the transport.

use std::error::Error as StdError;
use std::fmt;

/// A boxed error from an external collaborator.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A recoverable per-request failure, translated into a JSON error result.
#[derive(Debug)]
pub enum Failure {
    /// The access-control check rejected the caller.
    AccessDenied(String),
    /// The HTTP method is not one of GET, POST or OPTIONS.
    UnsupportedMethod(String),
    /// A management invocation failed; the wrapped failure is the real cause.
    Management(Box<Failure>),
    /// Any other failure raised by the engine.
    Engine(BoxError),
    /// A header name or value could not be represented on the wire.
    InvalidHeader(String),
    Io(std::io::Error),
}

impl Failure {
    /// Wraps an arbitrary engine error.
    pub fn engine(err: impl Into<BoxError>) -> Self {
        Self::Engine(err.into())
    }

    /// Wraps `cause` as a management-invocation failure.
    pub fn management(cause: Failure) -> Self {
        Self::Management(Box::new(cause))
    }

    /// Unwraps one level of management-invocation wrapping.
    pub fn into_cause(self) -> Self {
        match self {
            Self::Management(cause) => *cause,
            other => other,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied(reason) => write!(f, "access denied: {reason}"),
            Self::UnsupportedMethod(method) => write!(f, "HTTP Method {method} is not supported."),
            Self::Management(cause) => write!(f, "management invocation failed: {cause}"),
            Self::Engine(e) => write!(f, "{e}"),
            Self::InvalidHeader(detail) => write!(f, "invalid header: {detail}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl StdError for Failure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Management(cause) => Some(cause.as_ref() as &(dyn StdError + 'static)),
            Self::Engine(e) => Some(e.as_ref() as &(dyn StdError + 'static)),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Failure {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// The error type returned by the bridge's fallible entry points.
///
/// Application-level failures (access denied, bad method, engine errors) are
/// expressed as JSON error payloads, not as `Error`s. This type surfaces
/// infrastructure faults only.
#[derive(Debug)]
pub enum Error {
    /// Binding, accepting, or writing the response body failed.
    Io(std::io::Error),
    /// The security subsystem could not enter the principal's scope.
    Security(SecurityFailure),
    /// The request body could not be read off the connection.
    Body(BoxError),
    /// The blocking worker running the request did not complete.
    Task(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Security(e) => write!(f, "Security exception: {e}"),
            Self::Body(e) => write!(f, "request body: {e}"),
            Self::Task(msg) => write!(f, "request task: {msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Security(e) => Some(e),
            Self::Body(e) => Some(e.as_ref() as &(dyn StdError + 'static)),
            Self::Task(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<SecurityFailure> for Error {
    fn from(e: SecurityFailure) -> Self {
        Self::Security(e)
    }
}

/// Raised by a [`SecurityContext`](crate::SecurityContext) when it cannot run
/// a unit of work as the requested principal.
#[derive(Debug)]
pub struct SecurityFailure {
    message: String,
    source: Option<BoxError>,
}

impl SecurityFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self { message: message.into(), source: Some(source.into()) }
    }
}

impl fmt::Display for SecurityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for SecurityFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_cause_unwraps_one_level() {
        let wrapped = Failure::management(Failure::AccessDenied("nope".into()));
        assert!(matches!(wrapped.into_cause(), Failure::AccessDenied(r) if r == "nope"));

        let double = Failure::management(Failure::management(Failure::InvalidHeader("x".into())));
        assert!(matches!(double.into_cause(), Failure::Management(_)));
    }

    #[test]
    fn into_cause_leaves_plain_failures_alone() {
        let plain = Failure::UnsupportedMethod("PUT".into());
        assert!(matches!(plain.into_cause(), Failure::UnsupportedMethod(m) if m == "PUT"));
    }

    #[test]
    fn unsupported_method_message_names_the_method() {
        let f = Failure::UnsupportedMethod("PUT".into());
        assert_eq!(f.to_string(), "HTTP Method PUT is not supported.");
    }

    #[test]
    fn security_error_keeps_its_source() {
        let io = std::io::Error::other("login module unavailable");
        let err = Error::from(SecurityFailure::with_source("cannot enter scope", io));
        assert!(err.to_string().starts_with("Security exception: cannot enter scope"));
        let inner = err.source().and_then(|e| e.source()).map(|e| e.to_string());
        assert_eq!(inner.as_deref(), Some("login module unavailable"));
    }
}
