//! Handler trait for request processing.
//!
//! The [`Handler`] trait is the contract between the dispatch machinery and
//! business logic. It is generic over the request and response types; the
//! server erases those types once, when an endpoint is registered.

use crate::{RequestContext, ServiceError};
use serde::Serialize;
use std::future::Future;

/// A trait for handling typed requests.
///
/// Handlers receive the per-request [`RequestContext`] and the bound request
/// value, and return either a response or a [`ServiceError`]. The context
/// carries a deadline and a cancellation token; handlers should stop work
/// promptly once it is cancelled.
///
/// # Type Parameters
///
/// - `Req`: The bound request type
/// - `Res`: The response type (must implement `Serialize`)
///
/// # Example
///
/// ```rust
/// use storefront_core::{Handler, RequestContext, ServiceResult};
/// use serde::Serialize;
///
/// struct GetProductRequest {
///     id: String,
/// }
///
/// #[derive(Serialize)]
/// struct Product {
///     id: String,
/// }
///
/// struct GetProductHandler;
///
/// impl Handler<GetProductRequest, Product> for GetProductHandler {
///     async fn handle(&self, _ctx: &RequestContext, req: GetProductRequest) -> ServiceResult<Product> {
///         Ok(Product { id: req.id })
///     }
/// }
/// ```
pub trait Handler<Req, Res>: Send + Sync + 'static
where
    Req: Send + 'static,
    Res: Serialize + Send + 'static,
{
    /// Handles a request and returns a response.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if:
    /// - Business validation fails
    /// - The requested entity does not exist
    /// - The store or another dependency fails
    fn handle(
        &self,
        ctx: &RequestContext,
        request: Req,
    ) -> impl Future<Output = Result<Res, ServiceError>> + Send;
}

/// A function-based handler wrapper.
///
/// This allows using async closures directly as handlers, which is mostly
/// useful in tests.
///
/// # Example
///
/// ```rust
/// use storefront_core::{Empty, FnHandler, ServiceError};
///
/// let handler = FnHandler::new(|_ctx, _req: Empty| async { Ok::<_, ServiceError>(Empty {}) });
/// # let _ = handler;
/// ```
pub struct FnHandler<F, Req, Res, Fut>
where
    F: Fn(&RequestContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, ServiceError>> + Send,
    Req: Send + 'static,
    Res: Serialize + Send + 'static,
{
    func: F,
    _phantom: std::marker::PhantomData<fn(Req) -> (Res, Fut)>,
}

impl<F, Req, Res, Fut> FnHandler<F, Req, Res, Fut>
where
    F: Fn(&RequestContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, ServiceError>> + Send,
    Req: Send + 'static,
    Res: Serialize + Send + 'static,
{
    /// Creates a new function-based handler.
    #[must_use]
    pub const fn new(func: F) -> Self {
        Self {
            func,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, Req, Res, Fut> Handler<Req, Res> for FnHandler<F, Req, Res, Fut>
where
    F: Fn(&RequestContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, ServiceError>> + Send + 'static,
    Req: Send + 'static,
    Res: Serialize + Send + 'static,
{
    async fn handle(&self, ctx: &RequestContext, request: Req) -> Result<Res, ServiceError> {
        (self.func)(ctx, request).await
    }
}

/// Unit type for requests with nothing to bind or responses with no fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestRequest {
        name: String,
    }

    #[derive(Debug, PartialEq, serde::Serialize)]
    struct TestResponse {
        greeting: String,
    }

    struct TestHandler;

    impl Handler<TestRequest, TestResponse> for TestHandler {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            request: TestRequest,
        ) -> Result<TestResponse, ServiceError> {
            Ok(TestResponse {
                greeting: format!("Hello, {}!", request.name),
            })
        }
    }

    #[tokio::test]
    async fn test_handler_impl() {
        let handler = TestHandler;
        let ctx = RequestContext::mock();
        let request = TestRequest {
            name: "World".to_string(),
        };

        let response = handler.handle(&ctx, request).await.unwrap();
        assert_eq!(
            response,
            TestResponse {
                greeting: "Hello, World!".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fn_handler_error() {
        let handler = FnHandler::new(|_ctx, _req: Empty| async {
            Err::<Empty, _>(ServiceError::internal("Something went wrong"))
        });
        let ctx = RequestContext::mock();

        let err = handler.handle(&ctx, Empty {}).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Internal);
    }

    #[test]
    fn test_empty_serialize() {
        let json = serde_json::to_string(&Empty {}).expect("should serialize");
        assert_eq!(json, "{}");
    }
}
