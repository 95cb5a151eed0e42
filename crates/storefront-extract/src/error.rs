//! Extraction error types.
//!
//! Every failure names the source it came from, so the boundary can answer
//! with a precise diagnostic such as `invalid query parameters: ...`.

use std::fmt;
use storefront_core::ServiceError;

/// Source a value was being bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionSource {
    /// JSON request body
    Body,
    /// Query string parameters
    Query,
    /// Path parameters (e.g., `/products/{id}`)
    Path,
    /// HTTP headers
    Header,
}

impl ExtractionSource {
    /// All sources, in binding order.
    pub const ORDER: [Self; 4] = [Self::Body, Self::Query, Self::Path, Self::Header];

    /// Returns the phrase used in client-facing messages.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Body => "request body",
            Self::Query => "query parameters",
            Self::Path => "URL parameters",
            Self::Header => "header parameters",
        }
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => write!(f, "body"),
            Self::Query => write!(f, "query"),
            Self::Path => write!(f, "path"),
            Self::Header => write!(f, "header"),
        }
    }
}

/// Error that occurs while binding a request.
///
/// # Example
///
/// ```rust
/// use storefront_extract::{ExtractionError, ExtractionSource};
///
/// let err = ExtractionError::malformed(ExtractionSource::Query, "invalid digit found in string");
/// assert_eq!(err.extraction_source(), ExtractionSource::Query);
/// assert_eq!(err.to_string(), "invalid query parameters: invalid digit found in string");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    /// Source carried nothing but the request type requires it
    Missing,
    /// Source content could not be decoded
    Malformed,
    /// Body exceeds the size limit
    PayloadTooLarge,
    /// Body has a content type other than JSON
    UnsupportedMediaType,
}

impl ExtractionError {
    /// Creates an error for a source that is required but empty.
    #[must_use]
    pub fn missing(source: ExtractionSource) -> Self {
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            detail: format!("no {source} values present"),
        }
    }

    /// Creates an error for content that failed to decode.
    #[must_use]
    pub fn malformed(source: ExtractionSource, detail: impl Into<String>) -> Self {
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Malformed,
            detail: detail.into(),
        }
    }

    /// Creates an error for a body that's too large.
    #[must_use]
    pub fn payload_too_large(max_size: usize, actual_size: usize) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::PayloadTooLarge,
            detail: format!("payload too large: max {max_size} bytes, got {actual_size} bytes"),
        }
    }

    /// Creates an error for a body whose content type is not JSON.
    #[must_use]
    pub fn unsupported_media_type(actual: &str) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::UnsupportedMediaType,
            detail: format!("unsupported content type '{actual}'"),
        }
    }

    /// Returns the extraction source.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns the decoder's detail without the source prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Returns `true` if the source was required but empty.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.kind == ExtractionErrorKind::Missing
    }

    /// Returns a machine-readable code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::Missing => "MISSING_PARAMETER",
            ExtractionErrorKind::Malformed => "DESERIALIZATION_FAILED",
            ExtractionErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ExtractionErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {}: {}",
            self.extraction_source.description(),
            self.detail
        )
    }
}

impl std::error::Error for ExtractionError {}

impl From<ExtractionError> for ServiceError {
    fn from(err: ExtractionError) -> Self {
        ServiceError::validation(err.to_string())
    }
}
