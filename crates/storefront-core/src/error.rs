//! Error types for storefront handlers.
//!
//! [`ServiceError`] is the only failure a [`Handler`](crate::Handler) may
//! report. It carries an [`ErrorKind`] and a human-readable message, and
//! never a wire representation: translating a kind into a transport status
//! is the dispatcher's job.
//!
//! | `ErrorKind` | Meaning |
//! |---|---|
//! | `Validation` | Malformed or missing input in one of the request sources |
//! | `NotFound` | The requested entity does not exist upstream |
//! | `Upstream` | A store failure that is not a missing entity |
//! | `Timeout` | The per-request deadline elapsed |
//! | `Internal` | Anything unexpected or unclassified |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ServiceError`].
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Classification of a [`ServiceError`].
///
/// The kind drives both the response status and how much detail the
/// observability collaborator records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request validation errors (bad body, query, path or headers).
    Validation,
    /// Upstream reported the entity as absent.
    NotFound,
    /// Upstream failure other than not-found.
    Upstream,
    /// Per-request deadline exceeded.
    Timeout,
    /// Unexpected failure.
    Internal,
}

impl ErrorKind {
    /// Returns the snake_case label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Upstream => "upstream",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }

    /// Returns `true` if the message of this kind may be shown to clients.
    #[must_use]
    pub const fn is_client_facing(&self) -> bool {
        matches!(self, Self::Validation | Self::NotFound)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard handler error.
///
/// # Example
///
/// ```
/// use storefront_core::{ErrorKind, ServiceError};
///
/// fn validate_id(id: &str) -> Result<(), ServiceError> {
///     if id.is_empty() {
///         return Err(ServiceError::validation("id must not be empty"));
///     }
///     Ok(())
/// }
///
/// assert_eq!(validate_id("").unwrap_err().kind(), ErrorKind::Validation);
/// ```
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
    },

    /// Entity not found upstream.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The identifier that was looked up, if known.
        resource_id: Option<String>,
    },

    /// Upstream (store) failure.
    #[error("Upstream error: {message}")]
    Upstream {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Request deadline elapsed.
    #[error("Timeout: {message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ServiceError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_id: None,
        }
    }

    /// Creates a not found error that remembers which identifier was missing.
    #[must_use]
    pub fn not_found_resource(message: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_id: Some(resource_id.into()),
        }
    }

    /// Creates an upstream error.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an upstream error with a source error.
    pub fn upstream_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Upstream {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the bare message, without the kind prefix used by `Display`.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::NotFound { message, .. }
            | Self::Upstream { message, .. }
            | Self::Timeout { message }
            | Self::Internal { message, .. } => message,
        }
    }

    /// Renders the source chain for logs, if the error carries one.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Upstream {
                source: Some(source),
                ..
            }
            | Self::Internal {
                source: Some(source),
                ..
            } => Some(format!("{source:#}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_validation_error() {
        let error = ServiceError::validation("invalid query parameters: bad");
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.message(), "invalid query parameters: bad");
        assert!(error.to_string().starts_with("Validation error"));
    }

    #[test]
    fn test_not_found_resource() {
        let error = ServiceError::not_found_resource("product not found", "42");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(matches!(
            error,
            ServiceError::NotFound { resource_id: Some(ref id), .. } if id == "42"
        ));
    }

    #[test]
    fn test_upstream_with_source_keeps_chain() {
        let error = ServiceError::upstream_with_source(
            "store unavailable",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(error.kind(), ErrorKind::Upstream);
        assert!(error.source().is_some());
        assert_eq!(error.detail().as_deref(), Some("refused"));
    }

    #[test]
    fn test_internal_without_source_has_no_detail() {
        let error = ServiceError::internal("boom");
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert!(error.detail().is_none());
    }

    #[test]
    fn test_kind_client_facing() {
        assert!(ErrorKind::Validation.is_client_facing());
        assert!(ErrorKind::NotFound.is_client_facing());
        assert!(!ErrorKind::Upstream.is_client_facing());
        assert!(!ErrorKind::Timeout.is_client_facing());
        assert!(!ErrorKind::Internal.is_client_facing());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        assert_eq!(ErrorKind::Timeout.to_string(), "timeout");
    }
}
