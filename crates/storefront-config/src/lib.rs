//! Typed configuration for the storefront service.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`STOREFRONT__SECTION__KEY`, plus `PORT`)
//! - `.env` files via `dotenvy`
//! - Strict parsing: unknown fields are errors
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_ms = 5000
//! shutdown_timeout_secs = 5
//! read_timeout_secs = 3
//! keep_alive = true
//!
//! [store]
//! bucket = "products"
//! operation_timeout_ms = 3000
//! seed_file = "products.json"
//! latency_ms = 0
//!
//! [telemetry]
//! service_name = "storefront"
//! environment = "production"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//! file = "app.log"
//!
//! [telemetry.metrics]
//! enabled = true
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::StorefrontConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, PORT_VAR};
pub use schema::{
    LogFormat, LoggingSettings, MetricsSettings, ServerSettings, StoreSettings, TelemetrySettings,
};
