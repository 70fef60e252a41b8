//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use order_service::domain::ports::{CatalogGateway, FixtureIdentityVerifier, IdentityVerifier};
use order_service::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) catalog: Arc<dyn CatalogGateway>,
    pub(crate) identity: Arc<dyn IdentityVerifier>,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a configuration that rejects every bearer token until an
    /// identity verifier is attached.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, catalog: Arc<dyn CatalogGateway>) -> Self {
        Self {
            bind_addr,
            catalog,
            identity: Arc::new(FixtureIdentityVerifier),
            db_pool: None,
        }
    }

    /// Attach a database connection pool for the order repository.
    ///
    /// Without one, order ports fall back to fixtures.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Verify bearer tokens with `identity`.
    #[must_use]
    pub fn with_identity(mut self, identity: Arc<dyn IdentityVerifier>) -> Self {
        self.identity = identity;
        self
    }
}
