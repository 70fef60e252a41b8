//! Driving port for order reads.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Error, OrderId, OrderListFilter, Principal};

use super::order_command::OrderPayload;

/// Request to list the orders visible to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOrdersRequest {
    pub principal: Principal,
    pub filter: OrderListFilter,
    pub page: PageRequest,
}

/// Request to fetch one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOrderRequest {
    pub principal: Principal,
    pub order_id: OrderId,
}

/// Domain use-case port for order reads.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example() -> Result<(), order_service::domain::Error> {
/// use order_service::domain::ports::{FixtureOrderQuery, ListOrdersRequest, OrderQuery};
/// use order_service::domain::{OrderListFilter, Principal, Role, UserId};
///
/// let request = ListOrdersRequest {
///     principal: Principal::new(UserId::random(), Role::Customer, chrono::Utc::now()),
///     filter: OrderListFilter::default(),
///     page: pagination::PageRequest::default(),
/// };
/// let page = FixtureOrderQuery.list(request).await?;
/// assert!(page.items().is_empty());
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderQuery: Send + Sync {
    /// List one page of orders, newest first.
    async fn list(&self, request: ListOrdersRequest) -> Result<Page<OrderPayload>, Error>;

    /// Fetch one order the caller may see.
    async fn get(&self, request: GetOrderRequest) -> Result<OrderPayload, Error>;
}

/// Fixture query with no stored orders.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderQuery;

#[async_trait]
impl OrderQuery for FixtureOrderQuery {
    async fn list(&self, request: ListOrdersRequest) -> Result<Page<OrderPayload>, Error> {
        Ok(Page::new(Vec::new(), 0, request.page))
    }

    async fn get(&self, request: GetOrderRequest) -> Result<OrderPayload, Error> {
        Err(Error::not_found(format!(
            "Order {} not found",
            request.order_id
        )))
    }
}
