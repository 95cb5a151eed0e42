//! Wiring: configuration, repository and telemetry into a [`Server`].

use std::sync::Arc;

use http::StatusCode;
use storefront_config::{LogFormat, ServerSettings, StorefrontConfig, TelemetrySettings};
use storefront_core::Observer;
use storefront_server::{endpoint, raw, text_response, Dispatcher, Router, Server, ServerConfig};
use storefront_telemetry::{LogConfig, MetricsRegistry, TelemetryObserver};

use crate::handlers::{CreateProductHandler, GetProductHandler, HealthcheckHandler};
use crate::product::ProductRepository;

/// Content type of the Prometheus text exposition format.
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// The storefront service, ready to be turned into a [`Server`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use storefront::{App, InMemoryRepository};
/// use storefront_config::StorefrontConfig;
///
/// let app = App::new(StorefrontConfig::default(), Arc::new(InMemoryRepository::new("products")));
/// assert_eq!(app.router().route_count(), 3);
/// ```
pub struct App {
    config: StorefrontConfig,
    repository: Arc<dyn ProductRepository>,
    observer: Arc<dyn Observer>,
    metrics: Option<MetricsRegistry>,
}

impl App {
    /// Creates the app over `repository`, reporting through the telemetry
    /// observer.
    pub fn new(config: StorefrontConfig, repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            config,
            repository,
            observer: Arc::new(TelemetryObserver),
            metrics: None,
        }
    }

    /// Exposes `registry` on `GET /metrics`.
    #[must_use]
    pub fn with_metrics(mut self, registry: MetricsRegistry) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Replaces the dispatch observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Returns the dispatcher every route shares.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(Arc::clone(&self.observer))
            .with_timeout(self.config.server.request_timeout())
    }

    /// Builds the route table.
    pub fn router(&self) -> Router {
        let dispatcher = self.dispatcher();
        let telemetry = &self.config.telemetry;
        let version = telemetry
            .service_version
            .clone()
            .unwrap_or_else(|| crate::VERSION.to_string());

        let mut router = Router::new();
        router
            .get(
                "/products/{id}",
                "getProduct",
                endpoint(
                    GetProductHandler::new(Arc::clone(&self.repository)),
                    dispatcher.clone(),
                ),
            )
            .post(
                "/products",
                "createProduct",
                endpoint(
                    CreateProductHandler::new(Arc::clone(&self.repository)),
                    dispatcher.clone(),
                ),
            )
            .get(
                "/healthcheck",
                "healthcheck",
                endpoint(
                    HealthcheckHandler::new(telemetry.service_name.clone(), version),
                    dispatcher,
                ),
            );

        if let Some(registry) = self.metrics.clone() {
            router.get(
                "/metrics",
                "metrics",
                raw(move |_ctx, _request| {
                    text_response(StatusCode::OK, PROMETHEUS_CONTENT_TYPE, registry.render())
                }),
            );
        }

        router
    }

    /// Builds the server, consuming the app.
    pub fn into_server(self) -> Server {
        Server::new(
            server_config(&self.config.server),
            self.router(),
            self.dispatcher(),
        )
    }
}

/// Maps the `server` configuration section onto the server's own settings.
pub fn server_config(settings: &ServerSettings) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(settings.http_addr.clone())
        .shutdown_timeout(settings.shutdown_timeout())
        .read_timeout(settings.read_timeout())
        .keep_alive(settings.keep_alive)
        .build()
}

/// Maps the `telemetry` configuration section onto the logging setup.
pub fn log_config(settings: &TelemetrySettings) -> LogConfig {
    let logging = &settings.logging;
    LogConfig {
        enabled: logging.enabled,
        level: logging.level.clone(),
        json_format: logging.format == LogFormat::Json,
        file_line_info: logging.include_location,
        include_target: true,
        file: logging.file.clone(),
        service_name: settings.service_name.clone(),
    }
}
