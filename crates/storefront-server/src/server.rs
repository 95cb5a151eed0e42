//! HTTP server and lifecycle coordinator.
//!
//! [`Server::listen`] binds the listener; [`Listening::serve`] accepts
//! connections until the [`ShutdownSignal`] fires, then stops accepting and
//! gives in-flight connections up to the configured drain ceiling before
//! aborting them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_core::NoopObserver;
//! use storefront_server::{Dispatcher, Router, Server, ServerConfig, ShutdownSignal};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::builder().http_addr("127.0.0.1:0").build();
//! let server = Server::new(config, Router::new(), Dispatcher::new(Arc::new(NoopObserver)));
//!
//! let listening = server.listen().await?;
//! println!("listening on {}", listening.local_addr());
//!
//! let shutdown = ShutdownSignal::new();
//! shutdown.trigger();
//! let report = listening.serve(shutdown).await;
//! assert!(!report.outcome.is_forced());
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::{Request, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use storefront_core::{RequestContext, ServiceError};
use storefront_extract::{ExtractionContext, ExtractionError, ExtractionSource};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::lifecycle::{DrainOutcome, Lifecycle, LifecycleState, LifecycleWatch, ShutdownReport};
use crate::response::{error_response, HttpResponse};
use crate::router::Router;
use crate::shutdown::ShutdownSignal;

/// Pause after a failed `accept()` before retrying.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address
        addr: String,
        /// Parse failure
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address we tried to bind
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Termination signal handlers could not be installed.
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

/// State shared by every connection task.
struct Shared {
    router: Router,
    dispatcher: Dispatcher,
    read_timeout: Duration,
    keep_alive: bool,
    body_limit: usize,
}

/// The storefront HTTP server, before it starts listening.
pub struct Server {
    config: ServerConfig,
    shared: Arc<Shared>,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("router", &self.shared.router)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server in the `Starting` state.
    ///
    /// `dispatcher` reports failures that happen before an endpoint runs,
    /// such as an unreadable body.
    #[must_use]
    pub fn new(config: ServerConfig, router: Router, dispatcher: Dispatcher) -> Self {
        let shared = Arc::new(Shared {
            router,
            dispatcher,
            read_timeout: config.read_timeout(),
            keep_alive: config.keep_alive(),
            body_limit: config.body_limit(),
        });
        Self {
            config,
            shared,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns a watch on the lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleWatch {
        self.lifecycle.subscribe()
    }

    /// Binds the listener.
    ///
    /// On failure the server stays in `Starting` and no connection is ever
    /// accepted.
    pub async fn listen(self) -> Result<Listening, ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Listening {
            listener,
            local_addr,
            shutdown_timeout: self.config.shutdown_timeout(),
            shared: self.shared,
            lifecycle: self.lifecycle,
        })
    }

    /// Runs until SIGINT or SIGTERM, then drains and stops.
    pub async fn run(self) -> Result<ShutdownReport, ServerError> {
        let shutdown = ShutdownSignal::with_os_signals().map_err(ServerError::Signal)?;
        self.run_with_shutdown(shutdown).await
    }

    /// Runs until `shutdown` fires, then drains and stops.
    ///
    /// Useful for tests and embedders that control shutdown themselves.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<ShutdownReport, ServerError> {
        Ok(self.listen().await?.serve(shutdown).await)
    }
}

/// A server with a bound listener.
pub struct Listening {
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown_timeout: Duration,
    shared: Arc<Shared>,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for Listening {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listening")
            .field("local_addr", &self.local_addr)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

impl Listening {
    /// Returns the bound address, useful when binding port 0.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a watch on the lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleWatch {
        self.lifecycle.subscribe()
    }

    /// Serves connections until `shutdown` fires, then drains.
    ///
    /// The listener is closed as soon as draining starts. Connections that
    /// are still open when the drain ceiling expires are aborted and the
    /// report says so.
    pub async fn serve(self, shutdown: ShutdownSignal) -> ShutdownReport {
        let Self {
            listener,
            local_addr,
            shutdown_timeout,
            shared,
            lifecycle,
        } = self;

        let stop = CancellationToken::new();
        let accept = tokio::spawn(accept_loop(listener, shared, stop.clone()));
        lifecycle.advance(LifecycleState::Listening);
        tracing::info!(addr = %local_addr, "server listening");

        shutdown.triggered().await;

        let drain_started = Instant::now();
        lifecycle.advance(LifecycleState::Draining);
        stop.cancel();

        let mut connections = match accept.await {
            Ok(connections) => connections,
            Err(e) => {
                tracing::error!(error = %e, "accept loop terminated abnormally");
                JoinSet::new()
            }
        };

        tracing::info!(
            connections = connections.len(),
            timeout_ms = u64::try_from(shutdown_timeout.as_millis()).unwrap_or(u64::MAX),
            "draining in-flight connections"
        );

        let drained = tokio::time::timeout(shutdown_timeout, async {
            while let Some(joined) = connections.join_next().await {
                log_join_error(joined);
            }
        })
        .await;

        let outcome = if drained.is_ok() {
            DrainOutcome::Completed
        } else {
            let remaining = connections.len();
            tracing::warn!(remaining, "drain ceiling reached, forcing stop");
            connections.abort_all();
            while connections.join_next().await.is_some() {}
            DrainOutcome::Forced { remaining }
        };

        lifecycle.advance(LifecycleState::Stopped);
        let drain_elapsed = drain_started.elapsed();
        tracing::info!(forced = outcome.is_forced(), ?drain_elapsed, "server stopped");

        ShutdownReport {
            outcome,
            drain_elapsed,
        }
    }
}

/// Accepts connections until `stop` fires and hands back the open ones.
async fn accept_loop(listener: TcpListener, shared: Arc<Shared>, stop: CancellationToken) -> JoinSet<()> {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            () = stop.cancelled() => break,

            accepted = listener.accept() => match accepted {
                Ok((stream, remote_addr)) => {
                    connections.spawn(serve_connection(
                        stream,
                        remote_addr,
                        Arc::clone(&shared),
                        stop.clone(),
                    ));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                    if !back_off(&stop).await {
                        break;
                    }
                }
            },

            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                log_join_error(joined);
            }
        }
    }

    drop(listener);
    connections
}

/// Waits out [`ACCEPT_ERROR_BACKOFF`]. Returns `false` if `stop` fired first.
async fn back_off(stop: &CancellationToken) -> bool {
    tokio::select! {
        () = stop.cancelled() => false,
        () = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => true,
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(error = %e, "connection task panicked");
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    shared: Arc<Shared>,
    stop: CancellationToken,
) {
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(shared.read_timeout)
        .keep_alive(shared.keep_alive);

    let service = service_fn(move |req: Request<Incoming>| {
        let shared = Arc::clone(&shared);
        async move { Ok::<_, Infallible>(handle_request(&shared, req).await) }
    });

    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = stop.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        tracing::debug!(remote = %remote_addr, error = %e, "connection closed with error");
    }
}

async fn handle_request(shared: &Shared, req: Request<Incoming>) -> HttpResponse {
    let ctx = RequestContext::new();
    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id(),
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let (parts, body) = req.into_parts();

        let Some(route) = shared.router.match_route(&parts.method, parts.uri.path()) else {
            let (status, message) = if shared.router.has_path(parts.uri.path()) {
                (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
            } else {
                (StatusCode::NOT_FOUND, "route not found")
            };
            tracing::debug!(status = status.as_u16(), "no matching route");
            return error_response(status, message);
        };

        let ctx = ctx.with_operation_id(route.operation_id());
        let collected = tokio::time::timeout(
            shared.read_timeout,
            Limited::new(body, shared.body_limit).collect(),
        )
        .await;

        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                let detail = if e.downcast_ref::<LengthLimitError>().is_some() {
                    format!("body exceeds {} bytes", shared.body_limit)
                } else {
                    e.to_string()
                };
                let err = ExtractionError::malformed(ExtractionSource::Body, detail);
                return shared.dispatcher.fail(&ctx, &ServiceError::from(err));
            }
            Err(_) => {
                let err = ServiceError::timeout("request body was not received in time");
                return shared.dispatcher.fail(&ctx, &err);
            }
        };

        let endpoint = Arc::clone(route.endpoint());
        let request = ExtractionContext::new(
            parts.method,
            parts.uri,
            parts.headers,
            body,
            route.into_params(),
        )
        .with_body_limit(shared.body_limit);
        endpoint.call(ctx, request).await
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::NoopObserver;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(NoopObserver))
    }

    #[tokio::test]
    async fn test_accept_backoff_waits() {
        let started = Instant::now();
        assert!(back_off(&CancellationToken::new()).await);
        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn test_accept_backoff_ends_on_stop() {
        let stop = CancellationToken::new();
        stop.cancel();

        let started = Instant::now();
        assert!(!back_off(&stop).await);
        assert!(started.elapsed() < ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn test_invalid_address_stays_starting() {
        let config = ServerConfig::builder().http_addr("not-a-valid-address").build();
        let server = Server::new(config, Router::new(), dispatcher());
        let watch = server.lifecycle();

        let result = server.listen().await;

        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
        assert_eq!(watch.current(), LifecycleState::Starting);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let config = ServerConfig::builder().http_addr(addr.to_string()).build();

        let result = Server::new(config, Router::new(), dispatcher()).listen().await;

        let err = result.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .build();
        let server = Server::new(config, Router::new(), dispatcher());
        let watch = server.lifecycle();

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let report = tokio::time::timeout(Duration::from_secs(5), server.run_with_shutdown(shutdown))
            .await
            .expect("server should stop quickly")
            .expect("server should bind");

        assert_eq!(report.outcome, DrainOutcome::Completed);
        assert_eq!(watch.current(), LifecycleState::Stopped);
    }
}
