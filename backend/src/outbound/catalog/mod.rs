//! Catalog outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `CatalogGateway`
//! port.

mod dto;
mod http_gateway;

pub use http_gateway::HttpCatalogGateway;
