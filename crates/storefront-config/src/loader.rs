//! Layered configuration loader.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::{ConfigError, LogFormat, StorefrontConfig};

/// Legacy variable that overrides only the port of `server.http_addr`.
pub const PORT_VAR: &str = "PORT";

/// Configuration loader with a layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON, chosen by extension)
/// 3. Environment variables `PREFIX__SECTION__KEY`, then `PORT`
///
/// # Example
///
/// ```no_run
/// use storefront_config::ConfigLoader;
///
/// # fn main() -> Result<(), storefront_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("storefront.toml")?
///     .with_env_prefix("STOREFRONT")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: StorefrontConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Create a new loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = StorefrontConfig::default();
        self
    }

    /// Start from the development preset.
    ///
    /// ```
    /// use storefront_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = StorefrontConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = StorefrontConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The file replaces the current layer; sections and fields it omits
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, not valid
    /// TOML/JSON, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `format` ("toml" or "json").
    ///
    /// ```
    /// use storefront_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[store]\nbucket = \"catalog\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.store.bucket, "catalog");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Enable environment overrides with the given prefix.
    ///
    /// Variables use the form `PREFIX__SECTION__KEY`, for example
    /// `STOREFRONT__SERVER__HTTP_ADDR=0.0.0.0:9000`. The legacy `PORT`
    /// variable is honoured as well and wins over the address port.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file in the working directory, if any.
    ///
    /// Variables already set in the process environment are not replaced.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a `.env` file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(self) -> Result<StorefrontConfig, ConfigError> {
        self.load_from_vars(env::vars())
    }

    /// Like [`load`](Self::load) with an explicit variable set instead of
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_from_vars<I>(mut self, vars: I) -> Result<StorefrontConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if let Some(prefix) = self.env_prefix.take() {
            let mut port = None;
            for (key, value) in vars {
                if key == PORT_VAR {
                    port = Some(value);
                } else if let Some(path) = key
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_prefix("__"))
                {
                    self.apply_env_var(&key, path, &value)?;
                }
            }
            if let Some(port) = port {
                self.apply_port(&port)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> StorefrontConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<StorefrontConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_var(&mut self, key: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_u64(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_u64(key, value)?;
            }
            ["SERVER", "READ_TIMEOUT_SECS"] => {
                config.server.read_timeout_secs = parse_u64(key, value)?;
            }
            ["SERVER", "KEEP_ALIVE"] => config.server.keep_alive = parse_bool(key, value)?,

            ["STORE", "BUCKET"] => config.store.bucket = value.to_string(),
            ["STORE", "OPERATION_TIMEOUT_MS"] => {
                config.store.operation_timeout_ms = parse_u64(key, value)?;
            }
            ["STORE", "SEED_FILE"] => config.store.seed_file = non_empty(value).map(Into::into),
            ["STORE", "LATENCY_MS"] => config.store.latency_ms = parse_u64(key, value)?,

            ["TELEMETRY", "SERVICE_NAME"] => config.telemetry.service_name = value.to_string(),
            ["TELEMETRY", "SERVICE_VERSION"] => {
                config.telemetry.service_version = non_empty(value).map(str::to_string);
            }
            ["TELEMETRY", "ENVIRONMENT"] => config.telemetry.environment = value.to_string(),
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => config.telemetry.logging.level = value.to_string(),
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "FILE"] => {
                config.telemetry.logging.file = non_empty(value).map(Into::into);
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                config.telemetry.logging.include_location = parse_bool(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_bool(key, value)?;
            }

            // Unknown keys are ignored.
            _ => {}
        }

        Ok(())
    }

    fn apply_port(&mut self, value: &str) -> Result<(), ConfigError> {
        let port: u16 = value
            .parse()
            .map_err(|_| ConfigError::env_parse_error(PORT_VAR, "expected a port number"))?;
        let mut addr: SocketAddr = self.config.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.config.server.http_addr),
            )
        })?;
        addr.set_port(port);
        self.config.server.http_addr = addr.to_string();
        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::new().load_from_vars(Vec::new()).unwrap();
        assert_eq!(config, StorefrontConfig::default());
    }

    #[test]
    fn test_production_preset() {
        let config = ConfigLoader::new()
            .with_production()
            .load_from_vars(Vec::new())
            .unwrap();
        assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
http_addr = "127.0.0.1:3000"
request_timeout_ms = 250

[store]
seed_file = "seed.json"
"#
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load_from_vars(Vec::new())
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.server.request_timeout_ms, 250);
        assert_eq!(config.server.shutdown_timeout_secs, 5);
        assert_eq!(config.store.seed_file, Some(PathBuf::from("seed.json")));
    }

    #[test]
    fn test_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"telemetry": {{"service_name": "catalog"}}}}"#).unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load_from_vars(Vec::new())
            .unwrap();

        assert_eq!(config.telemetry.service_name, "catalog");
    }

    #[test]
    fn test_unknown_field_in_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nmax_connections = 10").unwrap();

        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new().with_file("/nonexistent/storefront.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/storefront.toml")
            .unwrap();
        assert_eq!(loader.load_unvalidated(), StorefrontConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env_prefix("STOREFRONT")
            .load_from_vars(vars(&[
                ("STOREFRONT__SERVER__HTTP_ADDR", "127.0.0.1:9000"),
                ("STOREFRONT__SERVER__KEEP_ALIVE", "off"),
                ("STOREFRONT__STORE__OPERATION_TIMEOUT_MS", "1500"),
                ("STOREFRONT__STORE__LATENCY_MS", "25"),
                ("STOREFRONT__TELEMETRY__LOGGING__FORMAT", "pretty"),
                ("STOREFRONT__TELEMETRY__METRICS__ENABLED", "false"),
                ("STOREFRONT__UNRELATED", "ignored"),
                ("OTHER__SERVER__HTTP_ADDR", "10.0.0.1:1"),
            ]))
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert!(!config.server.keep_alive);
        assert_eq!(config.store.operation_timeout_ms, 1500);
        assert_eq!(config.store.latency_ms, 25);
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
        assert!(!config.telemetry.metrics.enabled);
    }

    #[test]
    fn test_env_ignored_without_prefix() {
        let config = ConfigLoader::new()
            .load_from_vars(vars(&[("PORT", "9999")]))
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_port_overrides_address_port() {
        let config = ConfigLoader::new()
            .with_env_prefix("STOREFRONT")
            .load_from_vars(vars(&[
                ("PORT", "3001"),
                ("STOREFRONT__SERVER__HTTP_ADDR", "127.0.0.1:9000"),
            ]))
            .unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3001");
    }

    #[test]
    fn test_invalid_env_values() {
        let result = ConfigLoader::new()
            .with_env_prefix("STOREFRONT")
            .load_from_vars(vars(&[("STOREFRONT__SERVER__REQUEST_TIMEOUT_MS", "soon")]));
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        let result = ConfigLoader::new()
            .with_env_prefix("STOREFRONT")
            .load_from_vars(vars(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_validation_runs_after_overrides() {
        let result = ConfigLoader::new()
            .with_env_prefix("STOREFRONT")
            .load_from_vars(vars(&[("STOREFRONT__STORE__BUCKET", " ")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
