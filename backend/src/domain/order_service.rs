//! Order lifecycle domain service.
//!
//! Implements the order driving ports:
//! - create: validate locally, price each line against the catalog, persist;
//! - list and get: scoped by ownership and role;
//! - update_status and cancel: state machine check, then compare-and-set.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use pagination::Page;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    CancelOrderRequest, CatalogGateway, CatalogGatewayError, CreateOrderRequest, GetOrderRequest,
    ListOrdersRequest, OrderCommand, OrderPayload, OrderQuery, OrderRepository,
    OrderRepositoryError, UpdateOrderStatusRequest,
};
use crate::domain::{
    DeliveryDetails, Error, MoneyError, NewOrder, Order, OrderId, OrderLine, OrderScope,
    OrderSearch, OrderStatus, OrderValidationError, Principal, StatusChange,
    StatusTransitionError, ValidatedOrder,
};

fn map_repository_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("order repository unavailable: {message}"))
        }
        OrderRepositoryError::Query { message } => {
            Error::internal(format!("order repository error: {message}"))
        }
    }
}

fn map_catalog_error(error: CatalogGatewayError, index: usize) -> Error {
    match &error {
        CatalogGatewayError::NotFound { product_id } => Error::invalid_request(error.to_string())
            .with_details(json!({
                "field": format!("items[{index}].product_id"),
                "code": "product_not_found",
                "value": product_id,
            })),
        CatalogGatewayError::Timeout { .. } => Error::dependency_timeout(error.to_string()),
        CatalogGatewayError::Unavailable { .. } | CatalogGatewayError::Service { .. } => {
            Error::dependency_failure(error.to_string())
        }
    }
}

fn map_validation_error(error: &OrderValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(error.details())
}

fn map_transition_error(error: StatusTransitionError) -> Error {
    let details = match error {
        StatusTransitionError::NotAllowed { from, to } => json!({"from": from, "to": to}),
        StatusTransitionError::NotCancellable { from } => {
            json!({"from": from, "to": OrderStatus::Cancelled})
        }
    };
    Error::invalid_transition(error.to_string()).with_details(details)
}

fn map_money_error(error: MoneyError) -> Error {
    Error::invalid_request(format!("order cannot be priced: {error}"))
}

fn order_not_found(id: OrderId) -> Error {
    Error::not_found(format!("Order {id} not found"))
}

/// Order service implementing the order command and query driving ports.
///
/// `C` may be a trait object such as `dyn CatalogGateway`.
pub struct OrderLifecycleService<R, C: ?Sized> {
    order_repo: Arc<R>,
    catalog: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<R, C: ?Sized> OrderLifecycleService<R, C> {
    /// Create a new service over the repository, catalog, and clock.
    pub fn new(order_repo: Arc<R>, catalog: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            order_repo,
            catalog,
            clock,
        }
    }
}

impl<R, C> OrderLifecycleService<R, C>
where
    R: OrderRepository,
    C: CatalogGateway + ?Sized,
{
    /// Current time at the store's microsecond precision, so a returned order
    /// matches what a later read observes.
    fn now(&self) -> DateTime<Utc> {
        self.clock.utc().trunc_subsecs(6)
    }

    async fn load(&self, id: OrderId) -> Result<Order, Error> {
        self.order_repo
            .find_by_id(&id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| order_not_found(id))
    }

    async fn load_visible(&self, id: OrderId, principal: &Principal) -> Result<Order, Error> {
        let order = self.load(id).await?;
        if !principal.can_access(order.owner_id()) {
            return Err(Error::forbidden(
                "You do not have permission to access this order",
            ));
        }
        Ok(order)
    }

    async fn price_lines(
        &self,
        validated: ValidatedOrder,
    ) -> Result<(Vec<OrderLine>, DeliveryDetails), Error> {
        let (lines, delivery) = validated.into_parts();
        let mut priced = Vec::with_capacity(lines.len());
        for (index, line) in lines.into_iter().enumerate() {
            let snapshot = self
                .catalog
                .fetch_product(line.product_id())
                .await
                .map_err(|err| map_catalog_error(err, index))?;
            if !snapshot.is_available {
                return Err(Error::invalid_request(format!(
                    "Product {} is not available",
                    snapshot.name
                ))
                .with_details(json!({
                    "field": format!("items[{index}].product_id"),
                    "code": "product_unavailable",
                    "value": line.product_id(),
                })));
            }
            priced.push(OrderLine::price(line, &snapshot).map_err(map_money_error)?);
        }
        Ok((priced, delivery))
    }

    async fn apply_status(
        &self,
        order: &Order,
        next: OrderStatus,
        principal: &Principal,
    ) -> Result<Order, Error> {
        let change = StatusChange {
            order_id: order.id(),
            expected: order.status(),
            next,
            actor: principal.subject().clone(),
            at: self.now(),
        };
        let updated = self
            .order_repo
            .compare_and_set_status(&change)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                debug!(
                    order_id = %order.id(),
                    expected = %order.status(),
                    "status compare-and-set lost"
                );
                Error::conflict(format!(
                    "Order {} was modified concurrently; reload and retry",
                    order.id()
                ))
            })?;
        info!(
            order_id = %updated.id(),
            from = %change.expected,
            to = %updated.status(),
            actor = %principal.subject(),
            "order status updated"
        );
        Ok(updated)
    }
}

#[async_trait]
impl<R, C> OrderCommand for OrderLifecycleService<R, C>
where
    R: OrderRepository,
    C: CatalogGateway + ?Sized,
{
    async fn create(&self, request: CreateOrderRequest) -> Result<OrderPayload, Error> {
        let validated =
            ValidatedOrder::try_from(request.draft).map_err(|err| map_validation_error(&err))?;
        let (lines, delivery) = self.price_lines(validated).await?;
        let new_order = NewOrder::place(
            request.principal.subject().clone(),
            lines,
            delivery,
            self.now(),
        )
        .map_err(map_money_error)?;

        let order = self
            .order_repo
            .insert(&new_order)
            .await
            .map_err(map_repository_error)?;
        info!(
            order_id = %order.id(),
            owner_id = %order.owner_id(),
            total = %order.total(),
            lines = order.items().len(),
            "order created"
        );
        Ok(OrderPayload::from(order))
    }

    async fn update_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderPayload, Error> {
        if !request.principal.is_elevated() {
            return Err(Error::forbidden(
                "Only sellers and admins can update order status",
            ));
        }
        let order = self.load(request.order_id).await?;
        let next = order
            .status()
            .transition_to(request.status)
            .map_err(map_transition_error)?;
        let updated = self.apply_status(&order, next, &request.principal).await?;
        Ok(OrderPayload::from(updated))
    }

    async fn cancel(&self, request: CancelOrderRequest) -> Result<OrderPayload, Error> {
        let order = self
            .load_visible(request.order_id, &request.principal)
            .await?;
        let next = order.status().cancel().map_err(map_transition_error)?;
        let updated = self.apply_status(&order, next, &request.principal).await?;
        Ok(OrderPayload::from(updated))
    }
}

#[async_trait]
impl<R, C> OrderQuery for OrderLifecycleService<R, C>
where
    R: OrderRepository,
    C: CatalogGateway + ?Sized,
{
    async fn list(&self, request: ListOrdersRequest) -> Result<Page<OrderPayload>, Error> {
        let search = OrderSearch {
            scope: OrderScope::for_principal(&request.principal),
            filter: request.filter,
            page: request.page,
        };
        let (orders, total) = self
            .order_repo
            .list(&search)
            .await
            .map_err(map_repository_error)?;
        let payloads = orders.into_iter().map(OrderPayload::from).collect();
        Ok(Page::new(payloads, total, search.page))
    }

    async fn get(&self, request: GetOrderRequest) -> Result<OrderPayload, Error> {
        let order = self
            .load_visible(request.order_id, &request.principal)
            .await?;
        Ok(OrderPayload::from(order))
    }
}

#[cfg(test)]
#[path = "order_service_tests.rs"]
mod tests;
