//! HTTP inbound adapter exposing the order REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod orders;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
