//! Top-level configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, ServerSettings, StoreSettings, TelemetrySettings};

/// Complete storefront configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use storefront_config::StorefrontConfig;
///
/// let config = StorefrontConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.store.bucket, "products");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StorefrontConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Product store settings.
    #[serde(default)]
    pub store: StoreSettings,

    /// Logging and metrics settings.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl StorefrontConfig {
    /// Validates cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.read_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.read_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.store.bucket.trim().is_empty() {
            return Err(ConfigError::invalid_value("store.bucket", "must not be empty"));
        }

        if self.store.operation_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "store.operation_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.telemetry.logging.enabled && self.telemetry.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                "must not be empty when logging is enabled",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config.telemetry.environment = "development".to_string();
        config
    }

    /// Production preset: JSON info logs.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.environment = "production".to_string();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(StorefrontConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = StorefrontConfig::default();
        config.server.http_addr = "localhost".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = StorefrontConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = StorefrontConfig::default();
        config.store.operation_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_shutdown_timeout_allowed() {
        let mut config = StorefrontConfig::default();
        config.server.shutdown_timeout_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = StorefrontConfig::development();
        assert_eq!(dev.telemetry.logging.format, LogFormat::Pretty);
        assert_eq!(dev.telemetry.logging.level, "debug");

        let prod = StorefrontConfig::production();
        assert_eq!(prod.telemetry.logging.format, LogFormat::Json);
        assert_eq!(prod.telemetry.environment, "production");
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = toml::from_str::<StorefrontConfig>("[authorization]\nenabled = true");
        assert!(result.is_err());
    }
}
