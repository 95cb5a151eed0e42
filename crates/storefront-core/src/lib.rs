//! # Storefront Core
//!
//! Core types and traits shared by every storefront crate.
//!
//! - [`Handler`] - The contract every business operation implements
//! - [`RequestContext`] - Per-request state: id, timing, deadline and cancellation
//! - [`ServiceError`] - Tagged handler outcome with an [`ErrorKind`]
//! - [`Observer`] - Explicit observability collaborator for dispatch outcomes

#![doc(html_root_url = "https://docs.rs/storefront-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod observer;

pub use context::{CancelGuard, RequestContext, RequestId};
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use handler::{Empty, FnHandler, Handler};
pub use observer::{DispatchRecord, NoopObserver, Observer};
