//! Port for order persistence.
//!
//! Adapters store the aggregate and its lines atomically, generate the order
//! id, and implement status changes as a compare-and-set so concurrent
//! updaters cannot both win.

use async_trait::async_trait;

use crate::domain::{NewOrder, Order, OrderId, OrderSearch, StatusChange};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "order repository query failed: {message}",
    }
}

/// Port for writing and reading orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order with its lines and return it with its id.
    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderRepositoryError>;

    /// Find an order by id.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderRepositoryError>;

    /// Scan one page of orders, returning the page and the filtered total.
    async fn list(&self, search: &OrderSearch) -> Result<(Vec<Order>, u64), OrderRepositoryError>;

    /// Move an order from `change.expected` to `change.next`.
    ///
    /// Returns `None` when no row matched, meaning the order is missing or its
    /// status changed since it was read.
    async fn compare_and_set_status(
        &self,
        change: &StatusChange,
    ) -> Result<Option<Order>, OrderRepositoryError>;

    /// Confirm the store is reachable.
    async fn ping(&self) -> Result<(), OrderRepositoryError>;
}

/// Fixture repository for wiring without a database.
///
/// Every call fails with a connection error, so health checks report the
/// missing store as down.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderRepository;

const STORAGE_NOT_CONFIGURED: &str = "order storage is not configured";

#[async_trait]
impl OrderRepository for FixtureOrderRepository {
    async fn insert(&self, _order: &NewOrder) -> Result<Order, OrderRepositoryError> {
        Err(OrderRepositoryError::connection(STORAGE_NOT_CONFIGURED))
    }

    async fn find_by_id(&self, _id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        Err(OrderRepositoryError::connection(STORAGE_NOT_CONFIGURED))
    }

    async fn list(
        &self,
        _search: &OrderSearch,
    ) -> Result<(Vec<Order>, u64), OrderRepositoryError> {
        Err(OrderRepositoryError::connection(STORAGE_NOT_CONFIGURED))
    }

    async fn compare_and_set_status(
        &self,
        _change: &StatusChange,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        Err(OrderRepositoryError::connection(STORAGE_NOT_CONFIGURED))
    }

    async fn ping(&self) -> Result<(), OrderRepositoryError> {
        Err(OrderRepositoryError::connection(STORAGE_NOT_CONFIGURED))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::Utc;
    use pagination::PageRequest;
    use rstest::rstest;

    use super::*;
    use crate::domain::{OrderListFilter, OrderScope, OrderStatus, UserId};

    fn not_configured() -> OrderRepositoryError {
        OrderRepositoryError::connection(STORAGE_NOT_CONFIGURED)
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_ping_reports_missing_storage() {
        let err = FixtureOrderRepository.ping().await.expect_err("no store to ping");
        assert_eq!(err, not_configured());
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_reads_fail_as_unreachable() {
        let repo = FixtureOrderRepository;
        let search = OrderSearch {
            scope: OrderScope::All,
            filter: OrderListFilter::default(),
            page: PageRequest::default(),
        };
        assert_eq!(repo.find_by_id(&OrderId::random()).await, Err(not_configured()));
        assert_eq!(repo.list(&search).await, Err(not_configured()));
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_compare_and_set_fails_as_unreachable() {
        let change = StatusChange {
            order_id: OrderId::random(),
            expected: OrderStatus::Pending,
            next: OrderStatus::Confirmed,
            actor: UserId::random(),
            at: Utc::now(),
        };
        let result = FixtureOrderRepository.compare_and_set_status(&change).await;
        assert_eq!(result, Err(not_configured()));
    }

    #[rstest]
    fn connection_error_formats_message() {
        let err = OrderRepositoryError::connection("refused");
        assert!(err.to_string().contains("refused"));
    }
}
