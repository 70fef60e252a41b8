//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel rows and domain types and carry no
//! business rules. Row structs (`models.rs`) and table definitions
//! (`schema.rs`) stay private to this module. Connections come from a `bb8`
//! pool of `diesel-async` connections; migrations run over a blocking
//! connection at startup.
//!
//! # Example
//!
//! ```ignore
//! use order_service::outbound::persistence::{DbPool, DieselOrderRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/orders")).await?;
//! let repo = DieselOrderRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_order_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_order_repository::DieselOrderRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
