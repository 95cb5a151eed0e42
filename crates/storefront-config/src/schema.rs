//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server section.
///
/// # Example
///
/// ```
/// use storefront_config::ServerSettings;
///
/// let server = ServerSettings {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(server.request_timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Per-request handler deadline in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Drain ceiling after a termination signal, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Limit for reading request headers and body, in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Keep idle connections open between requests.
    #[serde(default = "default_true")]
    pub keep_alive: bool,
}

impl ServerSettings {
    /// Returns the request deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the drain ceiling.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Returns the read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            read_timeout_secs: default_read_timeout(),
            keep_alive: true,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_shutdown_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    3
}

fn default_true() -> bool {
    true
}

/// Product store section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    /// Name of the bucket holding product records.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Upper bound for a single store operation, in milliseconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,

    /// JSON file with an array of products loaded at startup.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Artificial delay added to every store operation, in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

impl StoreSettings {
    /// Returns the per-operation timeout.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Returns the artificial per-operation delay.
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            operation_timeout_ms: default_operation_timeout(),
            seed_file: None,
            latency_ms: 0,
        }
    }
}

fn default_bucket() -> String {
    "products".to_string()
}

fn default_operation_timeout() -> u64 {
    3000
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Stdout format.
    #[serde(default)]
    pub format: LogFormat,

    /// Optional file that receives a JSON copy of every event.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSettings {
    /// Record metrics and expose `/metrics`.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySettings {
    /// Service name reported by the healthcheck and logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Service version; the binary fills in its own when unset.
    #[serde(default)]
    pub service_version: Option<String>,

    /// Deployment environment (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            service_version: None,
            environment: default_environment(),
            logging: LoggingSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

fn default_service_name() -> String {
    "storefront".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerSettings::default();
        assert_eq!(server.http_addr, "0.0.0.0:8080");
        assert_eq!(server.request_timeout(), Duration::from_secs(5));
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(server.read_timeout(), Duration::from_secs(3));
        assert!(server.keep_alive);
    }

    #[test]
    fn test_store_defaults() {
        let store = StoreSettings::default();
        assert_eq!(store.bucket, "products");
        assert_eq!(store.operation_timeout(), Duration::from_secs(3));
        assert!(store.seed_file.is_none());
        assert_eq!(store.latency(), Duration::ZERO);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let server: ServerSettings = toml::from_str("keep_alive = false").unwrap();
        assert!(!server.keep_alive);
        assert_eq!(server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_log_format_is_lowercase() {
        let logging: LoggingSettings = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(logging.format, LogFormat::Pretty);
        assert!(toml::from_str::<LoggingSettings>(r#"format = "Pretty""#).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<StoreSettings>(r#"region = "eu""#).is_err());
    }
}
