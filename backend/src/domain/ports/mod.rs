//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod catalog_gateway;
mod identity_verifier;
mod order_command;
mod order_query;
mod order_repository;

#[cfg(test)]
pub use catalog_gateway::MockCatalogGateway;
pub use catalog_gateway::{CatalogGateway, CatalogGatewayError, FixtureCatalogGateway};
#[cfg(test)]
pub use identity_verifier::MockIdentityVerifier;
pub use identity_verifier::{CredentialRejection, FixtureIdentityVerifier, IdentityVerifier};
#[cfg(test)]
pub use order_command::MockOrderCommand;
pub use order_command::{
    CancelOrderRequest, CreateOrderRequest, FixtureOrderCommand, OrderCommand, OrderLinePayload,
    OrderPayload, UpdateOrderStatusRequest,
};
#[cfg(test)]
pub use order_query::MockOrderQuery;
pub use order_query::{FixtureOrderQuery, GetOrderRequest, ListOrdersRequest, OrderQuery};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{FixtureOrderRepository, OrderRepository, OrderRepositoryError};
