//! Extraction context providing access to request data.
//!
//! The [`ExtractionContext`] is a fully buffered view of one inbound
//! request: method, URI, headers, body bytes and the path parameters the
//! router captured. Decoders only ever read from it.

use crate::{Params, DEFAULT_BODY_LIMIT};
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// Buffered view of one inbound request.
///
/// # Example
///
/// ```rust
/// use storefront_extract::{ExtractionContext, Params};
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = Params::new();
/// params.push("id", "123");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/products/123"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.method(), &Method::GET);
/// assert_eq!(ctx.path_params().get("id"), Some("123"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    body_limit: usize,
}

impl ExtractionContext {
    /// Creates a new extraction context.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: Params,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Sets the largest body the decoders accept.
    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Returns a builder, mostly used by tests.
    #[must_use]
    pub fn builder() -> ExtractionContextBuilder {
        ExtractionContextBuilder::new()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the query string, if the URI has a non-empty one.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query().filter(|q| !q.is_empty())
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body as bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns the largest body the decoders accept.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Returns a specific header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Checks if the request body is empty or whitespace only.
    #[must_use]
    pub fn is_body_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Builder for constructing an `ExtractionContext`.
///
/// Method defaults to `GET` and URI to `/`.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    body_limit: Option<usize>,
}

impl ExtractionContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header. Invalid values are skipped.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a single path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Sets the body limit.
    #[must_use]
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    /// Builds the extraction context.
    #[must_use]
    pub fn build(self) -> ExtractionContext {
        ExtractionContext {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            path_params: self.path_params,
            body_limit: self.body_limit.unwrap_or(DEFAULT_BODY_LIMIT),
        }
    }
}
