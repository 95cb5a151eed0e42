//! Server configuration types.
//!
//! # Example
//!
//! ```rust
//! use storefront_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("0.0.0.0:8080")
//!     .shutdown_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.http_addr(), "0.0.0.0:8080");
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use storefront_extract::DEFAULT_BODY_LIMIT;

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Default drain ceiling in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Default read timeout in seconds, covering headers and body.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 3;

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances. The per-request
/// deadline is not set here; it belongs to the
/// [`Dispatcher`](crate::Dispatcher) each endpoint is built with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080")
    http_addr: String,

    /// Drain ceiling after a termination signal
    shutdown_timeout: Duration,

    /// Limit for reading request headers and body
    read_timeout: Duration,

    /// Whether idle connections are kept open between requests
    keep_alive: bool,

    /// Maximum accepted body size in bytes
    body_limit: usize,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses and returns the HTTP address as a `SocketAddr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// Returns the drain ceiling.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns whether keep-alive is enabled.
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Returns the maximum accepted body size.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    http_addr: String,
    shutdown_timeout: Duration,
    read_timeout: Duration,
    keep_alive: bool,
    body_limit: usize,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            keep_alive: true,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the drain ceiling.
    ///
    /// This is the maximum time the server waits for in-flight requests
    /// after a termination signal before aborting them.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Enables or disables keep-alive.
    #[must_use]
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    /// Sets the maximum accepted body size.
    #[must_use]
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr,
            shutdown_timeout: self.shutdown_timeout,
            read_timeout: self.read_timeout,
            keep_alive: self.keep_alive,
            body_limit: self.body_limit,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr(), DEFAULT_HTTP_ADDR);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.read_timeout(), Duration::from_secs(3));
        assert!(config.keep_alive());
        assert_eq!(config.body_limit(), DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:3000")
            .shutdown_timeout(Duration::from_secs(1))
            .keep_alive(false)
            .body_limit(16)
            .build();

        assert_eq!(config.socket_addr().unwrap().port(), 3000);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(1));
        assert!(!config.keep_alive());
        assert_eq!(config.body_limit(), 16);
    }

    #[test]
    fn test_invalid_socket_addr() {
        let config = ServerConfig::builder().http_addr("not-an-address").build();
        assert!(config.socket_addr().is_err());
    }
}
