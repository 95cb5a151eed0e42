//! Product and healthcheck handlers.
//!
//! Each handler comes with the request type it binds and the response type
//! it serializes. Store failures are translated into [`ServiceError`]s here;
//! the dispatcher turns those into status codes.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use storefront_core::{Handler, RequestContext, ServiceError};
use storefront_extract::{Bind, ExtractionError, Source};

use crate::product::{Product, ProductRepository, StoreError};

/// Message returned when a product does not exist.
pub const PRODUCT_NOT_FOUND: &str = "product not found";

/// Message returned when a product id is already taken.
pub const PRODUCT_EXISTS: &str = "product already exists";

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => ServiceError::not_found_resource(PRODUCT_NOT_FOUND, id),
            StoreError::AlreadyExists { .. } => ServiceError::validation(PRODUCT_EXISTS),
            err @ StoreError::Unavailable { .. } => {
                ServiceError::upstream_with_source("product store failed", err)
            }
        }
    }
}

#[derive(Deserialize)]
struct CorrelationHeader {
    #[serde(rename = "x-correlation-id")]
    correlation_id: Option<String>,
}

fn bind_correlation_id(source: &Source<'_>) -> Result<Option<String>, ExtractionError> {
    Ok(source
        .decode::<CorrelationHeader>()?
        .into_option()
        .and_then(|header| header.correlation_id))
}

/// Response carrying a single product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    /// The product.
    pub product: Product,
}

/// `GET /products/{id}` request.
#[derive(Debug, Default)]
pub struct GetProductRequest {
    /// Product id from the path.
    pub id: String,
    /// Caller-supplied `x-correlation-id` header.
    pub correlation_id: Option<String>,
}

#[derive(Deserialize)]
struct ProductPath {
    id: String,
}

impl Bind for GetProductRequest {
    fn bind_path(&mut self, source: &Source<'_>) -> Result<(), ExtractionError> {
        self.id = source.require::<ProductPath>()?.id;
        Ok(())
    }

    fn bind_headers(&mut self, source: &Source<'_>) -> Result<(), ExtractionError> {
        self.correlation_id = bind_correlation_id(source)?;
        Ok(())
    }
}

/// Looks a product up by id.
#[derive(Clone)]
pub struct GetProductHandler {
    repository: Arc<dyn ProductRepository>,
}

impl GetProductHandler {
    /// Creates the handler over `repository`.
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }
}

impl Handler<GetProductRequest, ProductResponse> for GetProductHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GetProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        tracing::debug!(
            request_id = %ctx.request_id(),
            correlation_id = request.correlation_id.as_deref(),
            id = %request.id,
            "fetching product"
        );

        let product = self.repository.get_product(ctx, &request.id).await?;
        Ok(ProductResponse { product })
    }
}

/// `POST /products` request.
#[derive(Debug, Default)]
pub struct CreateProductRequest {
    /// Product from the JSON body.
    pub product: Product,
    /// Caller-supplied `x-correlation-id` header.
    pub correlation_id: Option<String>,
}

impl Bind for CreateProductRequest {
    fn bind_body(&mut self, source: &Source<'_>) -> Result<(), ExtractionError> {
        self.product = source.require::<Product>()?;
        Ok(())
    }

    fn bind_headers(&mut self, source: &Source<'_>) -> Result<(), ExtractionError> {
        self.correlation_id = bind_correlation_id(source)?;
        Ok(())
    }
}

/// Stores a new product.
#[derive(Clone)]
pub struct CreateProductHandler {
    repository: Arc<dyn ProductRepository>,
}

impl CreateProductHandler {
    /// Creates the handler over `repository`.
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }
}

fn validate(product: &Product) -> Result<(), ServiceError> {
    if product.id.trim().is_empty() {
        return Err(ServiceError::validation("product id must not be empty"));
    }
    if product.id.contains('/') {
        return Err(ServiceError::validation("product id must not contain '/'"));
    }
    if product.name.trim().is_empty() {
        return Err(ServiceError::validation("product name must not be empty"));
    }
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(ServiceError::validation(
            "product price must be a non-negative number",
        ));
    }
    Ok(())
}

impl Handler<CreateProductRequest, ProductResponse> for CreateProductHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        validate(&request.product)?;

        tracing::debug!(
            request_id = %ctx.request_id(),
            correlation_id = request.correlation_id.as_deref(),
            id = %request.product.id,
            "creating product"
        );

        self.repository.create_product(ctx, &request.product).await?;
        Ok(ProductResponse {
            product: request.product,
        })
    }
}

/// `GET /healthcheck` request.
#[derive(Debug, Default)]
pub struct HealthcheckRequest {
    /// Include service details in the response.
    pub verbose: bool,
}

#[derive(Deserialize)]
struct HealthcheckQuery {
    verbose: Option<bool>,
}

impl Bind for HealthcheckRequest {
    fn bind_query(&mut self, source: &Source<'_>) -> Result<(), ExtractionError> {
        if let Some(query) = source.decode::<HealthcheckQuery>()?.into_option() {
            self.verbose = query.verbose.unwrap_or(false);
        }
        Ok(())
    }
}

/// Healthcheck response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Service name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Service version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Seconds since the handler was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
}

/// Liveness probe.
#[derive(Debug, Clone)]
pub struct HealthcheckHandler {
    service: String,
    version: String,
    started: Instant,
}

impl HealthcheckHandler {
    /// Creates the handler; uptime counts from now.
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            started: Instant::now(),
        }
    }
}

impl Handler<HealthcheckRequest, HealthResponse> for HealthcheckHandler {
    async fn handle(
        &self,
        _ctx: &RequestContext,
        request: HealthcheckRequest,
    ) -> Result<HealthResponse, ServiceError> {
        let mut response = HealthResponse {
            status: "ok".to_string(),
            service: None,
            version: None,
            uptime_seconds: None,
        };

        if request.verbose {
            response.service = Some(self.service.clone());
            response.version = Some(self.version.clone());
            response.uptime_seconds = Some(self.started.elapsed().as_secs());
        }

        Ok(response)
    }
}
