//! Port for product lookups against the external catalog.
//!
//! The catalog has no batch endpoint, so callers look up one product per
//! order line. Adapters bound each call with a timeout and never retry.

use async_trait::async_trait;

use crate::domain::{ProductId, ProductSnapshot};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalog gateway adapters.
    pub enum CatalogGatewayError {
        /// The catalog does not know the product.
        NotFound { product_id: String } =>
            "Product {product_id} not found in catalog",
        /// The catalog could not be reached or reported itself unavailable.
        Unavailable { message: String } =>
            "catalog unavailable: {message}",
        /// The catalog did not answer in time.
        Timeout { message: String } =>
            "catalog request timed out: {message}",
        /// The catalog answered with an unexpected status or body.
        Service { message: String } =>
            "catalog service error: {message}",
    }
}

/// Port for fetching product snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Fetch the current name, price, and availability of a product.
    async fn fetch_product(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductSnapshot, CatalogGatewayError>;

    /// Check that the catalog is reachable and healthy.
    async fn probe(&self) -> Result<(), CatalogGatewayError>;
}

/// Fixture gateway that reports every product as missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCatalogGateway;

#[async_trait]
impl CatalogGateway for FixtureCatalogGateway {
    async fn fetch_product(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductSnapshot, CatalogGatewayError> {
        Err(CatalogGatewayError::not_found(product_id.as_str()))
    }

    async fn probe(&self) -> Result<(), CatalogGatewayError> {
        Ok(())
    }
}
