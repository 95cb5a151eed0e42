//! Deadline-bounded handler dispatch.
//!
//! The [`Dispatcher`] is the only place that turns a [`ServiceError`] into a
//! transport status:
//!
//! | `ErrorKind` | Status | Body |
//! |---|---|---|
//! | `Validation` | 400 | the error message |
//! | `NotFound` | 404 | the error message |
//! | `Timeout` | 408 | `request timed out` |
//! | `Upstream` | 500 | `an internal error occurred` |
//! | `Internal` | 500 | `an internal error occurred` |

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use serde::Serialize;
use storefront_core::{DispatchRecord, ErrorKind, Handler, Observer, RequestContext, ServiceError};
use tokio::time::Instant;

use crate::response::{error_response, json_response, HttpResponse};

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const INTERNAL_MESSAGE: &str = "an internal error occurred";
const TIMEOUT_MESSAGE: &str = "request timed out";

/// Returns the status code for an error kind.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
        ErrorKind::Upstream | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Returns the message a client may see for `error`.
///
/// Only validation and not-found messages pass through verbatim.
#[must_use]
pub fn public_message(error: &ServiceError) -> &str {
    match error.kind() {
        ErrorKind::Validation | ErrorKind::NotFound => error.message(),
        ErrorKind::Timeout => TIMEOUT_MESSAGE,
        ErrorKind::Upstream | ErrorKind::Internal => INTERNAL_MESSAGE,
    }
}

/// Runs handlers under a deadline and converts outcomes into responses.
///
/// Cloning is cheap; all clones report to the same [`Observer`].
#[derive(Clone)]
pub struct Dispatcher {
    timeout: Duration,
    observer: Arc<dyn Observer>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default deadline.
    #[must_use]
    pub fn new(observer: Arc<dyn Observer>) -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            observer,
        }
    }

    /// Returns a copy of this dispatcher with a different deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            observer: Arc::clone(&self.observer),
        }
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invokes `handler` once under a derived, deadline-bounded context.
    ///
    /// The derived context is cancelled before this returns, whatever the
    /// outcome. If the deadline passes first the handler future is dropped
    /// and a timeout error is returned.
    pub async fn invoke<H, Req, Res>(
        &self,
        handler: &H,
        base: &RequestContext,
        request: Req,
    ) -> Result<Res, ServiceError>
    where
        H: Handler<Req, Res>,
        Req: Send + 'static,
        Res: Serialize + Send + 'static,
    {
        let (ctx, guard) = base.with_timeout(self.timeout);
        let deadline = ctx
            .deadline()
            .unwrap_or_else(|| Instant::now() + self.timeout);

        let outcome = tokio::time::timeout_at(deadline, handler.handle(&ctx, request)).await;
        guard.cancel();

        outcome.unwrap_or_else(|_| {
            Err(ServiceError::timeout(format!(
                "handler did not finish within {}ms",
                self.timeout.as_millis()
            )))
        })
    }

    /// Invokes `handler` and builds the response.
    ///
    /// Exactly one observer record is emitted.
    pub async fn dispatch<H, Req, Res>(
        &self,
        handler: &H,
        base: &RequestContext,
        request: Req,
    ) -> HttpResponse
    where
        H: Handler<Req, Res>,
        Req: Send + 'static,
        Res: Serialize + Send + 'static,
    {
        let outcome = self.invoke(handler, base, request).await.and_then(|res| {
            json_response(StatusCode::OK, &res).map_err(|e| {
                ServiceError::internal_with_source("failed to serialize response", e)
            })
        });

        match outcome {
            Ok(response) => {
                self.observer.dispatch_succeeded(&DispatchRecord {
                    ctx: base,
                    status: response.status().as_u16(),
                    elapsed: base.elapsed(),
                });
                response
            }
            Err(error) => self.fail(base, &error),
        }
    }

    /// Reports `error` and builds its response.
    ///
    /// Used for failures before a handler runs, such as binding errors.
    pub fn fail(&self, ctx: &RequestContext, error: &ServiceError) -> HttpResponse {
        let status = status_for(error.kind());
        self.observer.dispatch_failed(
            &DispatchRecord {
                ctx,
                status: status.as_u16(),
                elapsed: ctx.elapsed(),
            },
            error,
        );
        error_response(status, public_message(error))
    }
}
