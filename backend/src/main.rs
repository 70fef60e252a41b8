//! Order service entry-point: loads settings, prepares storage and outbound
//! adapters, then serves the REST API.

mod server;

use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use order_service::domain::TraceId;
use order_service::inbound::http::health::{HealthState, ServiceInfo};
use order_service::outbound::catalog::HttpCatalogGateway;
use order_service::outbound::identity::{JwtVerifier, JwtVerifierConfig};
use order_service::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use order_service::settings::ServiceSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        ServiceSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let config = build_server_config(&settings).await?;
    let health_state = HealthState::new().with_info(ServiceInfo {
        name: settings.app_name().to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        environment: settings.environment().to_owned(),
    });

    info!(bind_addr = %config.bind_addr, "starting order service");
    create_server(health_state, config)?
        .await
        .wrap_err("HTTP server terminated abnormally")
}

async fn build_server_config(settings: &ServiceSettings) -> Result<ServerConfig> {
    let catalog = HttpCatalogGateway::new(settings.catalog_url()?, settings.catalog_timeout()?)
        .wrap_err("failed to build catalog client")?;
    let mut config = ServerConfig::new(settings.bind_addr()?, Arc::new(catalog));

    match settings.jwt_secret() {
        Some(secret) => {
            let verifier = JwtVerifier::new(
                JwtVerifierConfig {
                    secret: secret.to_owned(),
                    audience: settings.jwt_audience.clone(),
                },
                Arc::new(DefaultClock),
            );
            config = config.with_identity(Arc::new(verifier));
        }
        None => warn!("no JWT secret configured; every bearer token will be rejected"),
    }

    match settings.database_url() {
        Some(database_url) => {
            migrate(database_url).await?;
            let pool_config =
                PoolConfig::new(database_url).with_max_size(settings.db_max_connections()?);
            let pool = DbPool::new(pool_config)
                .await
                .wrap_err("failed to build database pool")?;
            config = config.with_db_pool(pool);
        }
        None => warn!("no database URL configured; order endpoints use fixtures"),
    }

    Ok(config)
}

async fn migrate(database_url: &str) -> Result<()> {
    let trace_id = TraceId::generate();
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || {
        TraceId::sync_scope(trace_id, || run_pending_migrations(&url))
    })
    .await
    .wrap_err("migration task panicked")?
    .wrap_err("failed to apply database migrations")?;
    info!(applied, "database migrations complete");
    Ok(())
}
