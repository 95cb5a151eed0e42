//! Product domain and the repository boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_core::RequestContext;
use thiserror::Error;

/// A catalogue entry.
///
/// The service treats the record as opaque beyond its identifier; it is
/// stored and returned as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier, used as the storage key.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Unit price.
    pub price: f64,
}

impl Product {
    /// Creates a product without a description.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Errors reported by a [`ProductRepository`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No product is stored under the key.
    #[error("product {id} not found")]
    NotFound {
        /// The key that was looked up.
        id: String,
    },

    /// A product is already stored under the key.
    #[error("product {id} already exists")]
    AlreadyExists {
        /// The conflicting key.
        id: String,
    },

    /// The store could not complete the operation.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// What went wrong.
        reason: String,
    },
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an already-exists error.
    pub fn already_exists(id: impl Into<String>) -> Self {
        Self::AlreadyExists { id: id.into() }
    }

    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Storage for products.
///
/// Implementations must be safe to share across request tasks. The request
/// context is passed so implementations can honor its deadline and
/// cancellation.
#[async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    /// Fetches the product stored under `id`.
    async fn get_product(&self, ctx: &RequestContext, id: &str) -> Result<Product, StoreError>;

    /// Stores a new product; fails if its id is taken.
    async fn create_product(
        &self,
        ctx: &RequestContext,
        product: &Product,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_defaults_to_empty() {
        let product: Product =
            serde_json::from_str(r#"{"id":"42","name":"Lamp","price":19.5}"#).unwrap();
        assert_eq!(product, Product::new("42", "Lamp", 19.5));
    }

    #[test]
    fn test_missing_price_is_rejected() {
        assert!(serde_json::from_str::<Product>(r#"{"id":"42","name":"Lamp"}"#).is_err());
    }

    #[test]
    fn test_serializes_every_field() {
        let product = Product::new("7", "Mug", 4.0).with_description("stoneware");
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "7", "name": "Mug", "description": "stoneware", "price": 4.0})
        );
    }

    #[test]
    fn test_store_error_messages() {
        assert_eq!(StoreError::not_found("42").to_string(), "product 42 not found");
        assert_eq!(
            StoreError::already_exists("42").to_string(),
            "product 42 already exists"
        );
        assert_eq!(
            StoreError::unavailable("operation timed out").to_string(),
            "store unavailable: operation timed out"
        );
    }
}
