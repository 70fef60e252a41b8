//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::schema::{order_lines, orders};

/// Row struct for reading from the orders table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub owner_id: String,
    pub status: String,
    pub total: Decimal,
    pub delivery_address: String,
    pub contact_phone: String,
    pub delivery_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Insertable struct for new orders. `id` comes from the column default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub(crate) struct NewOrderRow<'a> {
    pub owner_id: &'a str,
    pub status: &'a str,
    pub total: Decimal,
    pub delivery_address: &'a str,
    pub contact_phone: &'a str,
    pub delivery_notes: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
}

/// Row struct for reading from the order_lines table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderLineRow {
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

/// Insertable struct for order lines.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_lines)]
pub(crate) struct NewOrderLineRow<'a> {
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: &'a str,
    pub product_name: &'a str,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
    pub notes: Option<&'a str>,
}
