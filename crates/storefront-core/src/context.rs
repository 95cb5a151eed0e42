//! Request context types.
//!
//! The [`RequestContext`] carries per-request state from the boundary into
//! handlers: a request id for log correlation, timing, and the deadline and
//! cancellation token the dispatcher derives for each invocation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps request ids sortable in logs.
///
/// # Example
///
/// ```
/// use storefront_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID, e.g. one read from a header.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request context handed to every [`Handler`](crate::Handler).
///
/// A context created at the boundary has no deadline. The dispatcher derives
/// a child with [`RequestContext::with_timeout`] for each invocation; the
/// child's token is cancelled when the returned [`CancelGuard`] drops.
///
/// Handlers that do long or detached work should watch
/// [`RequestContext::cancelled`] and stop promptly. Work that ignores the
/// token keeps running after the dispatcher has given up on it.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use storefront_core::RequestContext;
///
/// # tokio_test::block_on(async {
/// let ctx = RequestContext::new().with_operation_id("getProduct");
/// let (child, guard) = ctx.with_timeout(Duration::from_secs(5));
/// assert!(child.deadline().is_some());
/// drop(guard);
/// assert!(child.is_cancelled());
/// assert!(!ctx.is_cancelled());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    operation_id: Option<String>,
    started_at: Instant,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Creates a new request context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a new request context with the specified request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            operation_id: None,
            started_at: Instant::now(),
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a context for tests.
    #[must_use]
    pub fn mock() -> Self {
        Self::new().with_operation_id("test")
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the operation ID if set.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Returns a new context with the specified operation ID.
    #[must_use]
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the deadline, if one has been derived.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline.
    ///
    /// `None` means no deadline; `Some(Duration::ZERO)` means it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Derives a child context that expires after `timeout`.
    ///
    /// The child keeps the request id and operation id. Its deadline is the
    /// earlier of the parent's deadline and `now + timeout`. Its token is a
    /// child of the parent's token, so cancelling the parent cancels it too.
    /// Dropping the returned guard cancels the child and nothing else.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelGuard) {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        let token = self.cancel.child_token();
        let guard = CancelGuard {
            _guard: token.clone().drop_guard(),
        };
        let child = Self {
            request_id: self.request_id,
            operation_id: self.operation_id.clone(),
            started_at: self.started_at,
            deadline: Some(deadline),
            cancel: token,
        };
        (child, guard)
    }

    /// Returns `true` once this context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes when this context is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Returns a clone of the cancellation token for detached work.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels a derived [`RequestContext`] when dropped.
///
/// Returned by [`RequestContext::with_timeout`]. Because cancellation rides
/// on `Drop`, it runs on every exit path of the scope holding the guard.
#[derive(Debug)]
#[must_use = "dropping the guard cancels the derived context immediately"]
pub struct CancelGuard {
    _guard: DropGuard,
}

impl CancelGuard {
    /// Cancels the derived context now.
    pub fn cancel(self) {
        drop(self);
    }
}
