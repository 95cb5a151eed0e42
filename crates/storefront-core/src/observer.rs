//! Observability collaborator for dispatch outcomes.
//!
//! Request-handling code never reaches for a global logger. The dispatcher is
//! given an [`Observer`] at construction and reports exactly one record per
//! dispatch through it.

use crate::{RequestContext, ServiceError};
use std::time::Duration;

/// Facts about one finished dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRecord<'a> {
    /// Context the handler ran under.
    pub ctx: &'a RequestContext,
    /// Status code sent to the client.
    pub status: u16,
    /// Time spent since the request reached the boundary.
    pub elapsed: Duration,
}

/// Receives dispatch outcomes.
///
/// `dispatch_failed` gets the full [`ServiceError`], including any source
/// chain the client never sees.
pub trait Observer: Send + Sync + 'static {
    /// Called once for a request that produced a success response.
    fn dispatch_succeeded(&self, record: &DispatchRecord<'_>);

    /// Called once for a request that produced an error response.
    fn dispatch_failed(&self, record: &DispatchRecord<'_>, error: &ServiceError);
}

/// Observer that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn dispatch_succeeded(&self, _record: &DispatchRecord<'_>) {}

    fn dispatch_failed(&self, _record: &DispatchRecord<'_>, _error: &ServiceError) {}
}
