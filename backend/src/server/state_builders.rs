//! Builders for HTTP state ports and the health dependency checks.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use order_service::domain::OrderLifecycleService;
use order_service::domain::ports::{
    FixtureOrderCommand, FixtureOrderQuery, FixtureOrderRepository, OrderCommand, OrderQuery,
    OrderRepository,
};
use order_service::inbound::http::health::HealthChecks;
use order_service::inbound::http::state::HttpState;
use order_service::outbound::persistence::DieselOrderRepository;

use super::ServerConfig;

/// Build a command/query service pair using the real service when a backing
/// store is available, otherwise using fixture implementations.
fn build_service_pair<Store, S, Cmd, Query, MakeService, Cast>(
    store: &Option<Store>,
    make_service: MakeService,
    fixtures: (Arc<Cmd>, Arc<Query>),
    cast: Cast,
) -> (Arc<Cmd>, Arc<Query>)
where
    S: 'static,
    Cmd: ?Sized + 'static,
    Query: ?Sized + 'static,
    MakeService: FnOnce(&Store) -> S,
    Cast: FnOnce(Arc<S>) -> (Arc<Cmd>, Arc<Query>),
{
    match store {
        Some(store) => {
            let service = Arc::new(make_service(store));
            cast(service)
        }
        None => fixtures,
    }
}

fn build_order_pair<Store, Service>(
    store: &Option<Store>,
    make_service: impl FnOnce(&Store) -> Service,
) -> (Arc<dyn OrderCommand>, Arc<dyn OrderQuery>)
where
    Service: OrderCommand + OrderQuery + 'static,
{
    build_service_pair(
        store,
        make_service,
        (
            Arc::new(FixtureOrderCommand) as Arc<dyn OrderCommand>,
            Arc::new(FixtureOrderQuery) as Arc<dyn OrderQuery>,
        ),
        |service| {
            (
                service.clone() as Arc<dyn OrderCommand>,
                service as Arc<dyn OrderQuery>,
            )
        },
    )
}

fn order_repository(config: &ServerConfig) -> Option<Arc<DieselOrderRepository>> {
    config
        .db_pool
        .as_ref()
        .map(|pool| Arc::new(DieselOrderRepository::new(pool.clone())))
}

/// Build the shared HTTP state from configured ports and fixture fallbacks.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let catalog = config.catalog.clone();
    let (orders, orders_query) = build_order_pair(&order_repository(config), |repo| {
        OrderLifecycleService::new(repo.clone(), catalog, Arc::new(DefaultClock))
    });
    web::Data::new(HttpState::new(orders, orders_query, config.identity.clone()))
}

/// Dependencies probed by the aggregate health endpoint.
pub(super) fn build_health_checks(config: &ServerConfig) -> HealthChecks {
    let orders: Arc<dyn OrderRepository> = match order_repository(config) {
        Some(repo) => repo,
        None => Arc::new(FixtureOrderRepository),
    };
    HealthChecks {
        orders,
        catalog: config.catalog.clone(),
    }
}
