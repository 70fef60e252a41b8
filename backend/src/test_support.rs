//! In-process port doubles for integration tests.
//!
//! Compiled only with the `test-support` feature. The repository honours the
//! same contract as the Diesel adapter: atomic insert, newest-first listing,
//! and compare-and-set status updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::domain::ports::{
    CatalogGateway, CatalogGatewayError, OrderRepository, OrderRepositoryError,
};
use crate::domain::{
    Money, NewOrder, Order, OrderId, OrderSearch, ProductId, ProductSnapshot, StatusChange,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, OrderRepositoryError> {
    mutex
        .lock()
        .map_err(|_| OrderRepositoryError::query("in-memory store lock poisoned"))
}

struct ReadGate {
    barrier: Arc<Barrier>,
    remaining: usize,
}

/// Mutex-backed order store.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<OrderId, Order>>,
    read_gate: Mutex<Option<ReadGate>>,
    offline: Mutex<bool>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `readers` lookups wait for each other before returning.
    ///
    /// Lets two concurrent status updates both observe the same starting
    /// status, so the compare-and-set decides the winner.
    pub fn hold_next_reads(&self, readers: usize) {
        if let Ok(mut gate) = self.read_gate.lock() {
            *gate = Some(ReadGate {
                barrier: Arc::new(Barrier::new(readers)),
                remaining: readers,
            });
        }
    }

    /// Simulate a lost database connection for every subsequent call.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut flag) = self.offline.lock() {
            *flag = offline;
        }
    }

    /// Number of stored orders.
    pub fn len(&self) -> usize {
        self.orders.lock().map_or(0, |orders| orders.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current stored copy of an order.
    pub fn stored(&self, id: &OrderId) -> Option<Order> {
        self.orders.lock().ok()?.get(id).cloned()
    }

    fn ensure_online(&self) -> Result<(), OrderRepositoryError> {
        if *lock(&self.offline)? {
            return Err(OrderRepositoryError::connection("in-memory store offline"));
        }
        Ok(())
    }

    fn take_gate_slot(&self) -> Result<Option<Arc<Barrier>>, OrderRepositoryError> {
        let mut gate = lock(&self.read_gate)?;
        let Some(current) = gate.as_mut() else {
            return Ok(None);
        };
        let barrier = current.barrier.clone();
        current.remaining = current.remaining.saturating_sub(1);
        if current.remaining == 0 {
            *gate = None;
        }
        Ok(Some(barrier))
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderRepositoryError> {
        self.ensure_online()?;
        let stored = order.clone().into_order(OrderId::random());
        lock(&self.orders)?.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        self.ensure_online()?;
        let found = lock(&self.orders)?.get(id).cloned();
        if let Some(barrier) = self.take_gate_slot()? {
            barrier.wait().await;
        }
        Ok(found)
    }

    async fn list(&self, search: &OrderSearch) -> Result<(Vec<Order>, u64), OrderRepositoryError> {
        self.ensure_online()?;
        let mut visible: Vec<Order> = lock(&self.orders)?
            .values()
            .filter(|order| search.scope.admits(order) && search.filter.matches(order))
            .cloned()
            .collect();
        visible.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        let total = u64::try_from(visible.len())
            .map_err(|_| OrderRepositoryError::query("order count overflow"))?;
        let skip = usize::try_from(search.page.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(search.page.limit()).unwrap_or(usize::MAX);
        let page = visible.into_iter().skip(skip).take(limit).collect();
        Ok((page, total))
    }

    async fn compare_and_set_status(
        &self,
        change: &StatusChange,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        self.ensure_online()?;
        let mut orders = lock(&self.orders)?;
        let Some(current) = orders.get(&change.order_id) else {
            return Ok(None);
        };
        if current.status() != change.expected {
            return Ok(None);
        }
        let updated = current.clone().with_status_change(change);
        orders.insert(updated.id(), updated.clone());
        Ok(Some(updated))
    }

    async fn ping(&self) -> Result<(), OrderRepositoryError> {
        self.ensure_online()
    }
}

/// Catalog double serving a fixed product table.
///
/// Unknown ids answer `NotFound`. A forced failure, when set, answers every
/// lookup instead.
#[derive(Default)]
pub struct StubCatalog {
    products: Mutex<HashMap<String, ProductSnapshot>>,
    failure: Mutex<Option<CatalogGatewayError>>,
    lookups: AtomicUsize,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a product.
    pub fn with_product(self, id: &str, name: &str, price: Money, is_available: bool) -> Self {
        self.put_product(id, name, price, is_available);
        self
    }

    pub fn put_product(&self, id: &str, name: &str, price: Money, is_available: bool) {
        if let Ok(mut products) = self.products.lock() {
            products.insert(
                id.to_owned(),
                ProductSnapshot {
                    name: name.to_owned(),
                    unit_price: price,
                    is_available,
                },
            );
        }
    }

    /// Answer every lookup and probe with `failure` until cleared.
    pub fn fail_with(&self, failure: Option<CatalogGatewayError>) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = failure;
        }
    }

    /// Number of product lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn forced_failure(&self) -> Option<CatalogGatewayError> {
        self.failure.lock().ok().and_then(|slot| slot.clone())
    }
}

#[async_trait]
impl CatalogGateway for StubCatalog {
    async fn fetch_product(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductSnapshot, CatalogGatewayError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.forced_failure() {
            return Err(failure);
        }
        self.products
            .lock()
            .map_err(|_| CatalogGatewayError::service("stub catalog lock poisoned"))?
            .get(product_id.as_str())
            .cloned()
            .ok_or_else(|| CatalogGatewayError::not_found(product_id.as_str()))
    }

    async fn probe(&self) -> Result<(), CatalogGatewayError> {
        self.forced_failure().map_or(Ok(()), Err)
    }
}
