//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FixtureIdentityVerifier, FixtureOrderCommand, FixtureOrderQuery, IdentityVerifier,
    OrderCommand, OrderQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub orders: Arc<dyn OrderCommand>,
    pub orders_query: Arc<dyn OrderQuery>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl HttpState {
    /// Construct state from the order ports and the bearer token verifier.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use order_service::domain::ports::{
    ///     FixtureIdentityVerifier, FixtureOrderCommand, FixtureOrderQuery,
    /// };
    /// use order_service::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::new(
    ///     Arc::new(FixtureOrderCommand),
    ///     Arc::new(FixtureOrderQuery),
    ///     Arc::new(FixtureIdentityVerifier),
    /// );
    /// let _orders = state.orders.clone();
    /// ```
    pub fn new(
        orders: Arc<dyn OrderCommand>,
        orders_query: Arc<dyn OrderQuery>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            orders,
            orders_query,
            identity,
        }
    }

    /// Replace the identity verifier, keeping the order ports.
    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn IdentityVerifier>) -> Self {
        self.identity = identity;
        self
    }
}

impl Default for HttpState {
    fn default() -> Self {
        Self::new(
            Arc::new(FixtureOrderCommand),
            Arc::new(FixtureOrderQuery),
            Arc::new(FixtureIdentityVerifier),
        )
    }
}
