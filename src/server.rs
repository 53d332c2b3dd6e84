//! HTTP transport hosting a [`BridgeHandler`], with graceful shutdown.
//!
//! # Request model
//!
//! hyper reads the request and the body is collected up front. The bridge
//! itself is blocking (the engine may sit in a management call for as long
//! as that takes), so each request then runs on tokio's blocking pool. One
//! request, one worker thread, no shared mutable state.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or Ctrl-C the server stops accepting, lets every in-flight
//! connection finish, and then returns from [`Server::serve`].

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::exchange::Exchange;
use crate::handler::BridgeHandler;
use crate::security::Principal;

/// Decides who is calling, before the bridge sees the request.
///
/// Whatever principal is returned gets attached to the exchange; the bridge
/// then runs the request inside that principal's security scope.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, request: &http::request::Parts) -> Option<Principal>;
}

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, authenticator: None }
    }

    pub fn with_authenticator(mut self, authenticator: impl Authenticator) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Binds and serves until SIGTERM or Ctrl-C.
    pub async fn serve(self, handler: BridgeHandler) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_with_shutdown(listener, handler, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve_with_shutdown(
        self,
        listener: TcpListener,
        handler: BridgeHandler,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let shared = Arc::new(Shared { handler, authenticator: self.authenticator });

        info!(
            addr = %listener.local_addr()?,
            context = shared.handler.config().context_path(),
            "bridge listening"
        );

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // shutdown first, so a signal stops accepting even with a backlog
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let shared = Arc::clone(&shared);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let shared = Arc::clone(&shared);
                            async move { dispatch(shared, req, remote_addr).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("bridge stopped");
        Ok(())
    }
}

struct Shared {
    handler: BridgeHandler,
    authenticator: Option<Arc<dyn Authenticator>>,
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through the bridge.
///
/// An `Err` here is a fault the bridge could not turn into a JSON answer;
/// hyper drops the connection.
async fn dispatch(
    shared: Arc<Shared>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await.map_err(|e| Error::Body(e.into()))?.to_bytes();

    let principal = shared.authenticator.as_ref().and_then(|auth| auth.authenticate(&parts));
    let mut exchange = Exchange::new(parts.method, parts.uri, parts.headers, remote_addr, body)
        .with_principal(principal);

    let outcome = tokio::task::spawn_blocking(move || {
        let res = shared.handler.handle(&mut exchange);
        res.map(|()| exchange)
    })
    .await
    .map_err(|e| Error::Task(e.to_string()))?;

    match outcome {
        Ok(exchange) => Ok(exchange.into_response()),
        Err(e) => {
            error!(peer = %remote_addr, "request aborted: {e}");
            Err(e)
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. Only Ctrl-C on non-Unix targets.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
