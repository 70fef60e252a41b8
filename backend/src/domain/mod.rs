//! Domain primitives, aggregates, ports, and services.
//!
//! Purpose: define the order lifecycle in strongly typed terms, free of
//! transport and storage concerns. Adapters in `inbound` and `outbound`
//! depend on this module, never the other way round.
//!
//! Public surface:
//! - Error / ErrorCode: the error envelope shared by every adapter.
//! - Order and friends: the aggregate, its lines, money, and status.
//! - Principal / Role / UserId: the verified caller.
//! - OrderLifecycleService: create, list, get, status update, cancel.

pub mod error;
pub mod order_service;
pub mod orders;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::order_service::OrderLifecycleService;
pub use self::orders::*;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Principal, Role, UserId, UserValidationError};

