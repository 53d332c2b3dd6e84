//! HTTP method classification.
//!
//! The bridge only understands three methods. The method token is classified
//! once into a closed [`Dispatch`] variant and matched exhaustively from then
//! on; everything else lands in [`Dispatch::Unsupported`] and is answered
//! with a JSON error payload like any other failure.

use std::fmt;

use http::Method;

/// What the bridge does with a request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Dispatch {
    /// `GET`: parameters come from the path and query.
    Read,
    /// `POST`: the request body carries the operation.
    Write,
    /// `OPTIONS`: CORS preflight, headers only.
    Preflight,
    /// Anything else. Holds the method token for the error message.
    Unsupported(String),
}

impl Dispatch {
    /// Case-insensitive, so `get` dispatches like `GET`.
    pub fn classify(method: &Method) -> Self {
        let token = method.as_str();
        if token.eq_ignore_ascii_case("GET") {
            Self::Read
        } else if token.eq_ignore_ascii_case("POST") {
            Self::Write
        } else if token.eq_ignore_ascii_case("OPTIONS") {
            Self::Preflight
        } else {
            Self::Unsupported(token.to_owned())
        }
    }

    /// Read and write responses carry the cache and CORS header policy.
    pub fn sets_policy_headers(&self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read           => f.write_str("read"),
            Self::Write          => f.write_str("write"),
            Self::Preflight      => f.write_str("preflight"),
            Self::Unsupported(m) => write!(f, "unsupported ({m})"),
        }
    }
}
