//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed order repository using Diesel ORM
//! - **catalog**: reqwest-backed product lookups
//! - **identity**: local HS256 bearer token verification
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod catalog;
pub mod identity;
pub mod persistence;
