//! Structured logging setup.
//!
//! Logs go to stdout as JSON (production) or pretty text (development). When
//! [`LogConfig::file`] is set, every event is also written as JSON to that
//! file through a non-blocking writer.
//!
//! # Example
//!
//! ```rust,no_run
//! use storefront_telemetry::{init_logging, LogConfig};
//!
//! let _guard = init_logging(&LogConfig::production())?;
//! tracing::info!(operation = "getProduct", "processing request");
//! # Ok::<(), storefront_telemetry::TelemetryError>(())
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Log level or filter directive (e.g., "info", "storefront=debug").
    pub level: String,

    /// Whether stdout output is JSON.
    pub json_format: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Optional file receiving a JSON copy of every event.
    pub file: Option<PathBuf>,

    /// Service name attached to the startup event.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            include_target: true,
            file: None,
            service_name: "storefront".to_string(),
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            file_line_info: false,
            include_target: true,
            file: None,
            service_name: "storefront".to_string(),
        }
    }
}

/// Keeps the file writer alive; pending lines are flushed on drop.
///
/// Hold it for the lifetime of the process.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the level is not a valid filter
/// or a subscriber is already installed, and `TelemetryError::InvalidConfig`
/// if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<LogGuard> {
    if !config.enabled {
        return Ok(LogGuard::default());
    }

    let filter = create_env_filter(&config.level)?;
    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(config)];

    let file_guard = match &config.file {
        Some(path) => {
            let (layer, guard) = file_layer(path, config)?;
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        level = %config.level,
        file = ?config.file,
        "logging initialized"
    );

    Ok(LogGuard { _file: file_guard })
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

fn stdout_layer(config: &LogConfig) -> BoxedLayer {
    if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .boxed()
    }
}

fn file_layer(path: &Path, config: &LogConfig) -> TelemetryResult<(BoxedLayer, WorkerGuard)> {
    let appender = open_appender(path)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(config.include_target)
        .with_writer(writer)
        .boxed();

    Ok((layer, guard))
}

fn open_appender(path: &Path) -> TelemetryResult<RollingFileAppender> {
    let file_name = path.file_name().ok_or_else(|| {
        TelemetryError::InvalidConfig(format!("log file '{}' has no file name", path.display()))
    })?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(|e| {
            TelemetryError::InvalidConfig(format!("cannot open log file '{}': {e}", path.display()))
        })
}
