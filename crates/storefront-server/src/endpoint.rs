//! Type-erased boundary handlers.
//!
//! [`endpoint`] wraps a typed [`Handler`] into an [`Endpoint`] the router can
//! store next to endpoints of other request and response types. Calling it
//! binds the request, dispatches under the deadline and returns the
//! response. [`raw`] wraps a plain function for routes that bypass binding,
//! such as the metrics scrape.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use storefront_core::{Handler, RequestContext, ServiceError};
use storefront_extract::{bind, Bind, ExtractionContext};

use crate::dispatch::Dispatcher;
use crate::response::HttpResponse;

/// Boxed future returned by [`Endpoint::call`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boundary handler: buffered request in, response out.
pub trait Endpoint: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, ctx: RequestContext, request: ExtractionContext) -> BoxFuture<'_, HttpResponse>;
}

/// Wraps a typed handler as an [`Endpoint`].
///
/// The request type is bound with [`bind`] under the request's body limit.
/// A binding failure is reported through the dispatcher as a validation
/// error and the handler does not run.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use storefront_core::{Empty, FnHandler, NoopObserver, ServiceError};
/// use storefront_server::{endpoint, Dispatcher};
///
/// let dispatcher = Dispatcher::new(Arc::new(NoopObserver));
/// let ping = FnHandler::new(|_ctx, _req: Empty| async { Ok::<_, ServiceError>(Empty {}) });
/// let _endpoint = endpoint(ping, dispatcher);
/// ```
pub fn endpoint<H, Req, Res>(handler: H, dispatcher: Dispatcher) -> Arc<dyn Endpoint>
where
    H: Handler<Req, Res>,
    Req: Bind,
    Res: Serialize + Send + 'static,
{
    Arc::new(BoundEndpoint {
        handler,
        dispatcher,
        _types: PhantomData,
    })
}

/// Wraps a function that builds a response directly.
pub fn raw<F>(func: F) -> Arc<dyn Endpoint>
where
    F: Fn(&RequestContext, &ExtractionContext) -> HttpResponse + Send + Sync + 'static,
{
    Arc::new(RawEndpoint(func))
}

struct BoundEndpoint<H, Req, Res> {
    handler: H,
    dispatcher: Dispatcher,
    _types: PhantomData<fn() -> (Req, Res)>,
}

impl<H, Req, Res> Endpoint for BoundEndpoint<H, Req, Res>
where
    H: Handler<Req, Res>,
    Req: Bind,
    Res: Serialize + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: ExtractionContext) -> BoxFuture<'_, HttpResponse> {
        Box::pin(async move {
            match bind::<Req>(&request) {
                Ok(bound) => self.dispatcher.dispatch(&self.handler, &ctx, bound).await,
                Err(err) => {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        source = %err.extraction_source(),
                        code = err.error_code(),
                        "request binding failed"
                    );
                    self.dispatcher.fail(&ctx, &ServiceError::from(err))
                }
            }
        })
    }
}

struct RawEndpoint<F>(F);

impl<F> Endpoint for RawEndpoint<F>
where
    F: Fn(&RequestContext, &ExtractionContext) -> HttpResponse + Send + Sync + 'static,
{
    fn call(&self, ctx: RequestContext, request: ExtractionContext) -> BoxFuture<'_, HttpResponse> {
        let response = (self.0)(&ctx, &request);
        Box::pin(std::future::ready(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{StatusCode, Uri};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use storefront_core::{FnHandler, NoopObserver};
    use storefront_extract::{ExtractionError, Source};

    #[derive(Debug, Default)]
    struct Lookup {
        id: u64,
    }

    #[derive(Deserialize)]
    struct LookupPath {
        id: u64,
    }

    impl Bind for Lookup {
        fn bind_path(&mut self, source: &Source<'_>) -> Result<(), ExtractionError> {
            self.id = source.require::<LookupPath>()?.id;
            Ok(())
        }
    }

    fn lookup_endpoint() -> Arc<dyn Endpoint> {
        let handler = FnHandler::new(|_ctx, req: Lookup| async move {
            Ok::<_, ServiceError>(serde_json::json!({ "id": req.id }))
        });
        endpoint(handler, Dispatcher::new(Arc::new(NoopObserver)))
    }

    async fn call(endpoint: &Arc<dyn Endpoint>, request: ExtractionContext) -> (StatusCode, String) {
        let response = endpoint.call(RequestContext::mock(), request).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_binds_and_dispatches() {
        let request = ExtractionContext::builder()
            .uri(Uri::from_static("/lookup/42"))
            .path_param("id", "42")
            .build();
        let (status, body) = call(&lookup_endpoint(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"id":42}"#);
    }

    #[tokio::test]
    async fn test_binding_error_is_bad_request() {
        let request = ExtractionContext::builder()
            .uri(Uri::from_static("/lookup/abc"))
            .path_param("id", "abc")
            .build();
        let (status, body) = call(&lookup_endpoint(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with(r#"{"error":"invalid URL parameters: "#));
    }

    #[tokio::test]
    async fn test_raw_endpoint() {
        let metrics = raw(|_ctx, _req| crate::response::text_response(StatusCode::OK, "text/plain", "up 1"));
        let (status, body) = call(&metrics, ExtractionContext::builder().build()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "up 1");
    }
}
