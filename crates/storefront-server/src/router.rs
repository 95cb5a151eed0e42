//! Request routing and path matching.
//!
//! Routes map a method and a path template such as `/products/{id}` to an
//! operation id and an [`Endpoint`]. Templates are matched segment by
//! segment; `{name}` segments capture into [`Params`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::{Method, StatusCode};
//! use storefront_server::{raw, text_response, Router};
//!
//! let ok = raw(|_ctx, _req| text_response(StatusCode::OK, "text/plain", "ok"));
//!
//! let mut router = Router::new();
//! router.get("/products/{id}", "getProduct", ok.clone());
//! router.post("/products", "createProduct", ok);
//!
//! let found = router.match_route(&Method::GET, "/products/42").unwrap();
//! assert_eq!(found.operation_id(), "getProduct");
//! assert_eq!(found.params().get("id"), Some("42"));
//!
//! assert!(router.match_route(&Method::DELETE, "/products/42").is_none());
//! assert!(router.has_path("/products/42"));
//! ```

use std::sync::Arc;

use http::Method;
use storefront_extract::Params;

use crate::endpoint::Endpoint;

/// A matched route with extracted path parameters.
#[derive(Clone)]
pub struct RouteMatch {
    operation_id: Arc<str>,
    endpoint: Arc<dyn Endpoint>,
    params: Params,
}

impl RouteMatch {
    /// Returns the operation ID for this route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the endpoint registered for this route.
    #[must_use]
    pub fn endpoint(&self) -> &Arc<dyn Endpoint> {
        &self.endpoint
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Consumes the match and returns its parameters.
    #[must_use]
    pub fn into_params(self) -> Params {
        self.params
    }
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("operation_id", &self.operation_id)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// A literal segment (e.g., "products")
    Literal(String),

    /// A parameter segment (e.g., "{id}")
    Param(String),
}

#[derive(Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    operation_id: Arc<str>,
    endpoint: Arc<dyn Endpoint>,
}

impl Route {
    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    fn match_path(&self, path: &str) -> Option<Params> {
        let mut actual = path.split('/').filter(|s| !s.is_empty());
        let mut params = Params::new();

        for pattern in &self.segments {
            let segment = actual.next()?;
            match pattern {
                PathSegment::Literal(expected) if expected == segment => {}
                PathSegment::Literal(_) => return None,
                PathSegment::Param(name) => params.push(name.as_str(), segment),
            }
        }

        if actual.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// HTTP request router.
///
/// Routes are tried in registration order; the first match wins.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: impl AsRef<str>,
        operation_id: impl Into<String>,
        endpoint: Arc<dyn Endpoint>,
    ) -> &mut Self {
        let operation_id: String = operation_id.into();
        self.routes.push(Route {
            method,
            segments: Route::parse_segments(pattern.as_ref()),
            operation_id: operation_id.into(),
            endpoint,
        });
        self
    }

    /// Adds a `GET` route.
    pub fn get(
        &mut self,
        pattern: impl AsRef<str>,
        operation_id: impl Into<String>,
        endpoint: Arc<dyn Endpoint>,
    ) -> &mut Self {
        self.add_route(Method::GET, pattern, operation_id, endpoint)
    }

    /// Adds a `POST` route.
    pub fn post(
        &mut self,
        pattern: impl AsRef<str>,
        operation_id: impl Into<String>,
        endpoint: Arc<dyn Endpoint>,
    ) -> &mut Self {
        self.add_route(Method::POST, pattern, operation_id, endpoint)
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Finds the route for `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    operation_id: Arc::clone(&route.operation_id),
                    endpoint: Arc::clone(&route.endpoint),
                    params,
                })
            })
    }

    /// Returns `true` if any route matches `path`, whatever its method.
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.routes.iter().any(|route| route.match_path(path).is_some())
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes: Vec<_> = self
            .routes
            .iter()
            .map(|r| (r.method.as_str(), r.operation_id.as_ref()))
            .collect();
        f.debug_struct("Router").field("routes", &routes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::raw;
    use crate::response::text_response;
    use http::StatusCode;

    fn noop() -> Arc<dyn Endpoint> {
        raw(|_ctx, _req| text_response(StatusCode::OK, "text/plain", ""))
    }

    fn product_router() -> Router {
        let mut router = Router::new();
        router
            .get("/healthcheck", "healthcheck", noop())
            .get("/products/{id}", "getProduct", noop())
            .post("/products", "createProduct", noop())
            .get("/metrics", "metrics", noop());
        router
    }

    #[test]
    fn test_route_count() {
        assert_eq!(product_router().route_count(), 4);
    }

    #[test]
    fn test_literal_match() {
        let router = product_router();
        let found = router.match_route(&Method::GET, "/healthcheck").unwrap();
        assert_eq!(found.operation_id(), "healthcheck");
        assert!(found.params().is_empty());
    }

    #[test]
    fn test_param_match() {
        let router = product_router();
        let found = router.match_route(&Method::GET, "/products/42").unwrap();
        assert_eq!(found.operation_id(), "getProduct");
        assert_eq!(found.into_params().get("id"), Some("42"));
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let router = product_router();
        assert!(router.match_route(&Method::POST, "/products/").is_some());
    }

    #[test]
    fn test_segment_count_must_match() {
        let router = product_router();
        assert!(router.match_route(&Method::GET, "/products").is_none());
        assert!(router.match_route(&Method::GET, "/products/42/reviews").is_none());
    }

    #[test]
    fn test_method_mismatch() {
        let router = product_router();
        assert!(router.match_route(&Method::PUT, "/products/42").is_none());
        assert!(router.has_path("/products/42"));
        assert!(!router.has_path("/orders/42"));
    }
}
