//! In-memory product store.
//!
//! Products are kept in a [`DashMap`] keyed by id. Every operation is bounded
//! by the configured operation timeout and by the caller's cancellation, and
//! reports either as [`StoreError::Unavailable`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use storefront_config::StoreSettings;
use storefront_core::RequestContext;
use thiserror::Error;

use crate::product::{Product, ProductRepository, StoreError};

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors raised while preloading products.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The seed file could not be read.
    #[error("failed to read seed file {path}")]
    Read {
        /// Path to the seed file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The seed file is not a JSON array of products.
    #[error("failed to parse seed file {path}")]
    Parse {
        /// Path to the seed file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Two seeded products share an id.
    #[error("duplicate product id in seed: {id}")]
    Duplicate {
        /// The repeated id.
        id: String,
    },
}

/// A [`ProductRepository`] held in process memory.
///
/// # Example
///
/// ```rust
/// use storefront::{InMemoryRepository, Product};
///
/// let repository = InMemoryRepository::new("products");
/// repository.seed([Product::new("42", "Lamp", 19.5)]).unwrap();
/// assert_eq!(repository.len(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryRepository {
    bucket: String,
    products: DashMap<String, Product>,
    operation_timeout: Duration,
    latency: Duration,
}

impl InMemoryRepository {
    /// Creates an empty repository for `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            products: DashMap::new(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            latency: Duration::ZERO,
        }
    }

    /// Creates a repository from the `store` configuration section,
    /// loading the seed file when one is configured.
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, SeedError> {
        let repository = Self::new(settings.bucket.clone())
            .with_operation_timeout(settings.operation_timeout())
            .with_latency(settings.latency());

        if let Some(path) = &settings.seed_file {
            let count = repository.load_seed_file(path)?;
            tracing::info!(
                bucket = %repository.bucket,
                path = %path.display(),
                count,
                "seeded product store"
            );
        }

        Ok(repository)
    }

    /// Sets the upper bound for a single operation.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Adds an artificial delay to every operation.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the number of stored products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns `true` if no products are stored.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Inserts products, rejecting ids that are already present.
    ///
    /// Products inserted before a duplicate is found stay in the store.
    pub fn seed(&self, products: impl IntoIterator<Item = Product>) -> Result<usize, SeedError> {
        let mut count = 0;
        for product in products {
            match self.products.entry(product.id.clone()) {
                Entry::Occupied(_) => return Err(SeedError::Duplicate { id: product.id }),
                Entry::Vacant(slot) => {
                    slot.insert(product);
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Reads a JSON array of products from `path` and seeds them.
    pub fn load_seed_file(&self, path: &Path) -> Result<usize, SeedError> {
        let content = fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let products: Vec<Product> =
            serde_json::from_str(&content).map_err(|source| SeedError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        self.seed(products)
    }

    async fn bounded<T, F>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        op: F,
    ) -> Result<T, StoreError>
    where
        T: Send,
        F: FnOnce(&DashMap<String, Product>) -> Result<T, StoreError> + Send,
    {
        let work = async {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            op(&self.products)
        };

        tokio::select! {
            biased;
            () = ctx.cancelled() => {
                Err(StoreError::unavailable(format!("{operation} cancelled")))
            }
            result = tokio::time::timeout(self.operation_timeout, work) => {
                result.unwrap_or_else(|_| {
                    Err(StoreError::unavailable(format!(
                        "{operation} timed out after {}ms",
                        self.operation_timeout.as_millis()
                    )))
                })
            }
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepository {
    async fn get_product(&self, ctx: &RequestContext, id: &str) -> Result<Product, StoreError> {
        tracing::debug!(bucket = %self.bucket, id, "get product");
        self.bounded(ctx, "get", |products| {
            products
                .get(id)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| StoreError::not_found(id))
        })
        .await
    }

    async fn create_product(
        &self,
        ctx: &RequestContext,
        product: &Product,
    ) -> Result<(), StoreError> {
        tracing::debug!(bucket = %self.bucket, id = %product.id, "create product");
        self.bounded(ctx, "create", |products| {
            match products.entry(product.id.clone()) {
                Entry::Occupied(_) => Err(StoreError::already_exists(&product.id)),
                Entry::Vacant(slot) => {
                    slot.insert(product.clone());
                    Ok(())
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lamp() -> Product {
        Product::new("42", "Lamp", 19.5).with_description("brass desk lamp")
    }

    fn seed_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let repository = InMemoryRepository::new("products");
        let err = repository
            .get_product(&RequestContext::mock(), "42")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id } if id == "42"));
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let repository = InMemoryRepository::new("products");
        let ctx = RequestContext::mock();

        repository.create_product(&ctx, &lamp()).await.unwrap();
        assert_eq!(repository.get_product(&ctx, "42").await.unwrap(), lamp());
    }

    #[tokio::test]
    async fn test_create_duplicate_keeps_original() {
        let repository = InMemoryRepository::new("products");
        let ctx = RequestContext::mock();
        repository.create_product(&ctx, &lamp()).await.unwrap();

        let replacement = Product::new("42", "Other lamp", 1.0);
        let err = repository.create_product(&ctx, &replacement).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(repository.get_product(&ctx, "42").await.unwrap(), lamp());
    }

    #[tokio::test]
    async fn test_slow_operation_times_out() {
        let repository = InMemoryRepository::new("products")
            .with_latency(Duration::from_millis(500))
            .with_operation_timeout(Duration::from_millis(20));

        let err = repository
            .get_product(&RequestContext::mock(), "42")
            .await
            .unwrap_err();
        match err {
            StoreError::Unavailable { reason } => assert_eq!(reason, "get timed out after 20ms"),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_context_is_unavailable() {
        let repository = InMemoryRepository::new("products");
        repository.seed([lamp()]).unwrap();

        let (ctx, guard) = RequestContext::mock().with_timeout(Duration::from_secs(5));
        guard.cancel();

        let err = repository.get_product(&ctx, "42").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { reason } if reason == "get cancelled"));
    }

    #[test]
    fn test_seed_rejects_duplicates() {
        let repository = InMemoryRepository::new("products");
        let err = repository.seed([lamp(), lamp()]).unwrap_err();
        assert!(matches!(err, SeedError::Duplicate { id } if id == "42"));
        assert_eq!(repository.len(), 1);
    }

    #[test]
    fn test_load_seed_file() {
        let file = seed_file(
            r#"[
                {"id": "1", "name": "Mug", "price": 4.0},
                {"id": "2", "name": "Kettle", "description": "1.7l", "price": 29.99}
            ]"#,
        );

        let repository = InMemoryRepository::new("products");
        assert_eq!(repository.load_seed_file(file.path()).unwrap(), 2);
        assert_eq!(repository.len(), 2);
    }

    #[test]
    fn test_load_seed_file_errors() {
        let repository = InMemoryRepository::new("products");

        let err = repository
            .load_seed_file(Path::new("/nonexistent/seed.json"))
            .unwrap_err();
        assert!(matches!(err, SeedError::Read { .. }));

        let file = seed_file(r#"{"id": "1"}"#);
        let err = repository.load_seed_file(file.path()).unwrap_err();
        assert!(matches!(err, SeedError::Parse { .. }));
        assert!(repository.is_empty());
    }

    #[test]
    fn test_from_settings() {
        let file = seed_file(r#"[{"id": "1", "name": "Mug", "price": 4.0}]"#);
        let settings = StoreSettings {
            bucket: "catalog".to_string(),
            operation_timeout_ms: 250,
            seed_file: Some(file.path().to_path_buf()),
            latency_ms: 0,
        };

        let repository = InMemoryRepository::from_settings(&settings).unwrap();
        assert_eq!(repository.bucket(), "catalog");
        assert_eq!(repository.len(), 1);
        assert_eq!(repository.operation_timeout, Duration::from_millis(250));
    }
}
