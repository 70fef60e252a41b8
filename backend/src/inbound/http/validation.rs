//! Shared validation helpers for inbound HTTP adapters.
//!
//! Query strings and path segments arrive as text; these helpers parse them
//! into domain types and report failures with `{field, code, value}` details.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, Money, OrderId, OrderStatus};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidStatus,
    InvalidAmount,
    InvalidRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidStatus => "invalid_status",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::InvalidRange => "invalid_range",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn parse_order_id(value: &str) -> Result<OrderId, Error> {
    Uuid::parse_str(value.trim()).map(OrderId::from).map_err(|_| {
        ValidationError::new("order_id", "Invalid order ID format")
            .with_value(ErrorCode::InvalidUuid, value)
    })
}

pub(crate) fn parse_status(value: &str, field: FieldName) -> Result<OrderStatus, Error> {
    OrderStatus::from_str(value).map_err(|_| {
        let allowed = OrderStatus::ALL.map(OrderStatus::as_str).join(", ");
        let field = field.as_str();
        ValidationError::new(field, format!("{field} must be one of: {allowed}"))
            .with_value(ErrorCode::InvalidStatus, value)
    })
}

pub(crate) fn parse_optional_status(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<OrderStatus>, Error> {
    value.map(|raw| parse_status(&raw, field)).transpose()
}

fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be an RFC 3339 timestamp"))
        .with_value(ErrorCode::InvalidTimestamp, value)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: String,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, &value))
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

/// Parse a non-negative decimal amount such as `"41.96"`.
pub(crate) fn parse_amount(value: String, field: FieldName) -> Result<Money, Error> {
    Decimal::from_str(value.trim())
        .ok()
        .and_then(|amount| Money::new(amount).ok())
        .ok_or_else(|| {
            let field = field.as_str();
            ValidationError::new(field, format!("{field} must be a non-negative decimal"))
                .with_value(ErrorCode::InvalidAmount, value)
        })
}

pub(crate) fn parse_optional_amount(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<Money>, Error> {
    value.map(|raw| parse_amount(raw, field)).transpose()
}

/// Report an inverted range with both bounds named.
pub(crate) fn invalid_range_error(
    lower: FieldName,
    upper: FieldName,
    message: impl Into<String>,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": lower.as_str(),
        "related": upper.as_str(),
        "code": ErrorCode::InvalidRange.as_str(),
    }))
}
