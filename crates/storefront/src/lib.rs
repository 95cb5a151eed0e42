//! # Storefront
//!
//! A product catalogue served over HTTP.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /products/{id}` | [`handlers::GetProductHandler`] |
//! | `POST /products` | [`handlers::CreateProductHandler`] |
//! | `GET /healthcheck` | [`handlers::HealthcheckHandler`] |
//! | `GET /metrics` | Prometheus scrape |
//!
//! Products live behind the [`ProductRepository`] boundary; the bundled
//! [`InMemoryRepository`] keeps them in a concurrent map and can be seeded
//! from a JSON file at startup.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront::{App, InMemoryRepository};
//! use storefront_config::StorefrontConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = StorefrontConfig::default();
//! let repository = Arc::new(InMemoryRepository::from_settings(&config.store)?);
//! let server = App::new(config, repository).into_server();
//! let report = server.run().await?;
//! println!("stopped: {:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/storefront/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod handlers;
pub mod product;
pub mod store;

pub use app::App;
pub use product::{Product, ProductRepository, StoreError};
pub use store::{InMemoryRepository, SeedError};

/// Crate version, reported by the verbose healthcheck.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
