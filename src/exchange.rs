//! The per-request context: what came in, and where the answer goes.
//!
//! An [`Exchange`] is created by the transport for one request and dropped
//! when that request is done. The bridge mutates its [`ResponseSink`] and
//! nothing else.

use std::io::{self, Write};
use std::net::SocketAddr;

use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use http::{HeaderMap, Method, Response, StatusCode, Uri};
use http_body_util::Full;

use crate::security::Principal;

/// One HTTP request/response pair.
pub struct Exchange {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    remote_addr: SocketAddr,
    body: Bytes,
    principal: Option<Principal>,
    response: ResponseSink,
}

impl Exchange {
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        remote_addr: SocketAddr,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            remote_addr,
            body,
            principal: None,
            response: ResponseSink::default(),
        }
    }

    /// Attaches an authenticated principal.
    pub fn with_principal(mut self, principal: Option<Principal>) -> Self {
        self.principal = principal;
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn remote_addr(&self) -> SocketAddr { self.remote_addr }
    pub fn principal(&self) -> Option<&Principal> { self.principal.as_ref() }

    /// A fresh reader over the request body.
    pub fn body(&self) -> Reader<Bytes> {
        self.body.clone().reader()
    }

    pub fn response(&self) -> &ResponseSink { &self.response }
    pub fn response_mut(&mut self) -> &mut ResponseSink { &mut self.response }

    /// Converts the finished exchange into a response for hyper.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        self.response.into_response()
    }
}

/// Response headers, status line and body of an [`Exchange`].
///
/// The status is sent once, via [`send_headers`](Self::send_headers). The
/// body can only be written afterwards, through a [`BodyWriter`] that closes
/// the sink when it goes out of scope.
#[derive(Debug, Default)]
pub struct ResponseSink {
    headers: HeaderMap,
    status: Option<StatusCode>,
    length: usize,
    body: Vec<u8>,
    closed: bool,
}

impl ResponseSink {
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn status(&self) -> Option<StatusCode> { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Whether the output stream has been released.
    pub fn is_closed(&self) -> bool { self.closed }

    /// Commits the status line and the exact body length. A zero length
    /// means no body follows, and the sink is closed right away.
    pub fn send_headers(&mut self, status: StatusCode, length: usize) -> io::Result<()> {
        if self.status.is_some() {
            return Err(io::Error::other("response headers already sent"));
        }
        self.status = Some(status);
        self.length = length;
        if length == 0 {
            self.closed = true;
        }
        Ok(())
    }

    /// Opens the body stream. Fails before `send_headers` or after close.
    pub fn writer(&mut self) -> io::Result<BodyWriter<'_>> {
        if self.status.is_none() {
            return Err(io::Error::other("response headers not sent yet"));
        }
        if self.closed {
            return Err(io::Error::other("response body already closed"));
        }
        Ok(BodyWriter { sink: self })
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

/// Body stream of a [`ResponseSink`]. Dropping it closes the sink.
pub struct BodyWriter<'a> {
    sink: &'a mut ResponseSink,
}

impl Write for BodyWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.sink.length - self.sink.body.len();
        if buf.len() > remaining {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("body exceeds declared length of {} bytes", self.sink.length),
            ));
        }
        self.sink.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for BodyWriter<'_> {
    fn drop(&mut self) {
        self.sink.closed = true;
    }
}
