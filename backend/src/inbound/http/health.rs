//! Health endpoints: orchestration probes and the aggregate dependency check.
//!
//! `/health/ready` and `/health/live` read process flags only. `/health`
//! pings the order store and probes the catalog on every call.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::ports::{CatalogGateway, OrderRepository};

/// Identity reported by the aggregate health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub environment: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "Order Service".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".to_owned(),
        }
    }
}

/// Dependencies checked by `GET /health`.
#[derive(Clone)]
pub struct HealthChecks {
    pub orders: Arc<dyn OrderRepository>,
    pub catalog: Arc<dyn CatalogGateway>,
}

/// Shared health state for readiness, liveness, and dependency checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    info: ServiceInfo,
    checks: Option<HealthChecks>,
    clock: Arc<dyn Clock>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            info: ServiceInfo::default(),
            checks: None,
            clock: Arc::new(DefaultClock),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `info` from the aggregate check.
    #[must_use]
    pub fn with_info(mut self, info: ServiceInfo) -> Self {
        self.info = info;
        self
    }

    /// Check `checks` on every aggregate health call.
    #[must_use]
    pub fn with_checks(mut self, checks: HealthChecks) -> Self {
        self.checks = Some(checks);
        self
    }

    /// Stamp reports using `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }

    /// Run every dependency check and assemble the report.
    pub async fn report(&self) -> HealthReport {
        let mut checks = BTreeMap::new();
        if let Some(deps) = &self.checks {
            let (database, catalog) = futures_util::join!(deps.orders.ping(), deps.catalog.probe());
            checks.insert(
                "database".to_owned(),
                DependencyCheck::from_result("database", database),
            );
            checks.insert(
                "catalog".to_owned(),
                DependencyCheck::from_result("catalog", catalog),
            );
        }
        let healthy = checks.values().all(DependencyCheck::is_up);
        HealthReport {
            status: if healthy { "healthy" } else { "unhealthy" }.to_owned(),
            service: self.info.name.clone(),
            version: self.info.version.clone(),
            environment: self.info.environment.clone(),
            timestamp: self.clock.utc(),
            checks,
        }
    }
}

/// Outcome of one dependency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DependencyCheck {
    /// `up` or `down`.
    #[schema(example = "up")]
    pub status: String,
    /// Fixed failure reason when the dependency is down. Adapter detail is
    /// logged, never returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyCheck {
    fn from_result<E: fmt::Display>(dependency: &str, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "up".to_owned(),
                error: None,
            },
            Err(error) => {
                warn!(dependency, error = %error, "health check failed");
                Self {
                    status: "down".to_owned(),
                    error: Some(format!("{dependency} unavailable")),
                }
            }
        }
    }

    fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// Aggregate health response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    /// `healthy` or `unhealthy`.
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "Order Service")]
    pub service: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    #[schema(example = "production")]
    pub environment: String,
    pub timestamp: DateTime<Utc>,
    pub checks: BTreeMap<String, DependencyCheck>,
}

/// Aggregate health check. Returns 200 when every dependency answers and
/// 503 with the same body shape otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Service and dependencies are healthy", body = HealthReport),
        (status = 503, description = "A dependency is unhealthy", body = HealthReport)
    )
)]
#[get("/health")]
pub async fn health(state: web::Data<HealthState>) -> HttpResponse {
    let report = state.report().await;
    let mut response = if report.status == "healthy" {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(report)
}

/// Readiness probe. Return 200 once startup has finished and 503 before.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}
