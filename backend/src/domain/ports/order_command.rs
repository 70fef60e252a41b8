//! Driving port for order mutations.
//!
//! Inbound adapters place, advance, and cancel orders through this port
//! without importing the catalog or persistence adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Error, Money, Order, OrderDraft, OrderId, OrderLine, OrderStatus, Principal, ProductId, UserId,
};

/// Serializable order line for driving ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLinePayload {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub total_price: Money,
    pub notes: Option<String>,
}

impl From<&OrderLine> for OrderLinePayload {
    fn from(value: &OrderLine) -> Self {
        Self {
            product_id: value.product_id().clone(),
            product_name: value.product_name().to_owned(),
            unit_price: value.unit_price(),
            quantity: value.quantity().get(),
            total_price: value.total_price(),
            notes: value.notes().map(str::to_owned),
        }
    }
}

/// Serializable order for driving ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub id: OrderId,
    pub owner_id: UserId,
    pub items: Vec<OrderLinePayload>,
    pub status: OrderStatus,
    pub total: Money,
    pub delivery_address: String,
    pub contact_phone: String,
    pub delivery_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub updated_by: Option<UserId>,
}

impl From<Order> for OrderPayload {
    fn from(value: Order) -> Self {
        Self {
            id: value.id(),
            owner_id: value.owner_id().clone(),
            items: value.items().iter().map(OrderLinePayload::from).collect(),
            status: value.status(),
            total: value.total(),
            delivery_address: value.delivery().address().to_owned(),
            contact_phone: value.delivery().phone().to_owned(),
            delivery_notes: value.delivery().notes().map(str::to_owned),
            created_at: value.created_at(),
            updated_at: value.updated_at(),
            estimated_delivery: value.estimated_delivery(),
            updated_by: value.updated_by().cloned(),
        }
    }
}

/// Request to place a new order for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub principal: Principal,
    pub draft: OrderDraft,
}

/// Request to move an order along the status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrderStatusRequest {
    pub principal: Principal,
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Request to cancel an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOrderRequest {
    pub principal: Principal,
    pub order_id: OrderId,
}

/// Domain use-case port for order mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderCommand: Send + Sync {
    /// Validate, price, and persist a new order.
    async fn create(&self, request: CreateOrderRequest) -> Result<OrderPayload, Error>;

    /// Apply a status transition. Restricted to elevated roles.
    async fn update_status(&self, request: UpdateOrderStatusRequest)
    -> Result<OrderPayload, Error>;

    /// Cancel a pending or confirmed order.
    async fn cancel(&self, request: CancelOrderRequest) -> Result<OrderPayload, Error>;
}

/// Fixture command used when no catalog or store is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderCommand;

#[async_trait]
impl OrderCommand for FixtureOrderCommand {
    async fn create(&self, _request: CreateOrderRequest) -> Result<OrderPayload, Error> {
        Err(Error::service_unavailable("order storage is not configured"))
    }

    async fn update_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderPayload, Error> {
        Err(Error::not_found(format!(
            "Order {} not found",
            request.order_id
        )))
    }

    async fn cancel(&self, request: CancelOrderRequest) -> Result<OrderPayload, Error> {
        Err(Error::not_found(format!(
            "Order {} not found",
            request.order_id
        )))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::{ErrorCode, Role};

    #[rstest]
    #[tokio::test]
    async fn fixture_cancel_reports_missing_order() {
        let request = CancelOrderRequest {
            principal: Principal::new(UserId::random(), Role::Customer, Utc::now()),
            order_id: OrderId::random(),
        };
        let err = FixtureOrderCommand
            .cancel(request)
            .await
            .expect_err("fixture has no orders");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
