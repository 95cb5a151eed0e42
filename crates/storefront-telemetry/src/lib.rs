//! Observability for the storefront service.
//!
//! - **Logging**: structured JSON or pretty output through
//!   `tracing-subscriber`, with an optional JSON copy in a log file
//! - **Metrics**: Prometheus-format request counters and latency histograms
//!   via the `metrics` crate
//! - **Observer**: [`TelemetryObserver`] turns dispatch outcomes into log
//!   events and metric samples
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_telemetry::{init_logging, LogConfig, MetricsRegistry, TelemetryObserver};
//!
//! # fn main() -> Result<(), storefront_telemetry::TelemetryError> {
//! let _guard = init_logging(&LogConfig::production())?;
//! let registry = MetricsRegistry::install()?;
//! let observer = Arc::new(TelemetryObserver::new());
//!
//! println!("{}", registry.render());
//! # drop(observer);
//! # Ok(())
//! # }
//! ```
//!
//! # Metrics Endpoint
//!
//! ```text
//! # TYPE storefront_requests_total counter
//! storefront_requests_total{operation="getProduct",status="200",kind="ok"} 1234
//! storefront_requests_total{operation="getProduct",status="404",kind="not_found"} 56
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;
pub mod observer;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogGuard};
pub use metrics::MetricsRegistry;
pub use observer::TelemetryObserver;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
