//! # Storefront Server
//!
//! HTTP server infrastructure for the storefront service:
//!
//! - [`Dispatcher`] runs a [`Handler`](storefront_core::Handler) under a
//!   deadline and maps its outcome to a response
//! - [`endpoint`] turns a handler into a type-erased [`Endpoint`] that binds,
//!   dispatches and responds
//! - [`Router`] maps method and path templates to endpoints
//! - [`Server`] owns the listener and the [`LifecycleState`] machine that
//!   drives startup, signal handling and the bounded drain
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_core::{Empty, FnHandler, NoopObserver, ServiceError};
//! use storefront_server::{endpoint, Dispatcher, Router, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(Arc::new(NoopObserver));
//!     let ping = FnHandler::new(|_ctx, _req: Empty| async { Ok::<_, ServiceError>(Empty {}) });
//!
//!     let mut router = Router::new();
//!     router.get("/ping", "ping", endpoint(ping, dispatcher.clone()));
//!
//!     let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//!     let report = Server::new(config, router, dispatcher).run().await?;
//!     println!("stopped: {:?}", report.outcome);
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/storefront-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatch;
mod endpoint;
mod lifecycle;
mod response;
mod router;
mod server;
mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use dispatch::{public_message, status_for, Dispatcher, DEFAULT_REQUEST_TIMEOUT};
pub use endpoint::{endpoint, raw, BoxFuture, Endpoint};
pub use lifecycle::{DrainOutcome, LifecycleState, LifecycleWatch, ShutdownReport};
pub use response::{error_response, json_response, text_response, ErrorBody, HttpResponse, ResponseBody};
pub use router::{RouteMatch, Router};
pub use server::{Listening, Server, ServerError};
pub use shutdown::ShutdownSignal;
