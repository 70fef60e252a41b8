//! The order aggregate and its priced lines.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::draft::{DeliveryDetails, ProductId, ValidatedLine};
use super::money::{Money, MoneyError, Quantity};
use super::status::OrderStatus;
use crate::domain::UserId;

/// Hours between placing an order and its estimated delivery.
pub const DELIVERY_ESTIMATE_HOURS: i64 = 2;

/// Store-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

impl From<Uuid> for OrderId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Catalog data captured when an order is priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub name: String,
    pub unit_price: Money,
    pub is_available: bool,
}

/// Stored aggregate failed a consistency check on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderIntegrityError {
    NoLines,
    LineTotalMismatch { position: usize },
    TotalMismatch { stored: Money, computed: Money },
    Arithmetic(MoneyError),
}

impl fmt::Display for OrderIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLines => write!(f, "stored order has no lines"),
            Self::LineTotalMismatch { position } => {
                write!(f, "stored line {position} total does not match unit price x quantity")
            }
            Self::TotalMismatch { stored, computed } => write!(
                f,
                "stored order total {stored} does not match line sum {computed}"
            ),
            Self::Arithmetic(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for OrderIntegrityError {}

impl From<MoneyError> for OrderIntegrityError {
    fn from(value: MoneyError) -> Self {
        Self::Arithmetic(value)
    }
}

/// One priced line of an order. Catalog fields are a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    product_id: ProductId,
    product_name: String,
    unit_price: Money,
    quantity: Quantity,
    total_price: Money,
    notes: Option<String>,
}

impl OrderLine {
    /// Price a validated line against the catalog snapshot.
    pub fn price(line: ValidatedLine, snapshot: &ProductSnapshot) -> Result<Self, MoneyError> {
        let (product_id, quantity, notes) = line.into_parts();
        let total_price = snapshot.unit_price.times(quantity)?;
        Ok(Self {
            product_id,
            product_name: snapshot.name.clone(),
            unit_price: snapshot.unit_price,
            quantity,
            total_price,
            notes,
        })
    }

    /// Rebuild a stored line, checking its total.
    pub fn restore(
        position: usize,
        record: OrderLineRecord,
    ) -> Result<Self, OrderIntegrityError> {
        let computed = record.unit_price.times(record.quantity)?;
        if computed != record.total_price {
            return Err(OrderIntegrityError::LineTotalMismatch { position });
        }
        Ok(Self {
            product_id: record.product_id,
            product_name: record.product_name,
            unit_price: record.unit_price,
            quantity: record.quantity,
            total_price: record.total_price,
            notes: record.notes,
        })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Raw stored line fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRecord {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
    pub total_price: Money,
    pub notes: Option<String>,
}

impl From<&OrderLine> for OrderLineRecord {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            total_price: line.total_price,
            notes: line.notes.clone(),
        }
    }
}

/// A priced order that has not been stored yet, so it has no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    owner_id: UserId,
    items: Vec<OrderLine>,
    total: Money,
    delivery: DeliveryDetails,
    created_at: DateTime<Utc>,
    estimated_delivery: DateTime<Utc>,
}

impl NewOrder {
    /// Assemble a pending order placed at `now`.
    pub fn place(
        owner_id: UserId,
        items: Vec<OrderLine>,
        delivery: DeliveryDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, MoneyError> {
        let total = Money::sum(items.iter().map(OrderLine::total_price))?;
        Ok(Self {
            owner_id,
            items,
            total,
            delivery,
            created_at: now,
            estimated_delivery: now + Duration::hours(DELIVERY_ESTIMATE_HOURS),
        })
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        OrderStatus::Pending
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn delivery(&self) -> &DeliveryDetails {
        &self.delivery
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn estimated_delivery(&self) -> DateTime<Utc> {
        self.estimated_delivery
    }

    /// Attach the identifier the store generated.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            owner_id: self.owner_id,
            items: self.items,
            status: OrderStatus::Pending,
            total: self.total,
            delivery: self.delivery,
            created_at: self.created_at,
            updated_at: self.created_at,
            estimated_delivery: self.estimated_delivery,
            updated_by: None,
        }
    }
}

/// Raw stored order fields, as read by persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub owner_id: UserId,
    pub items: Vec<OrderLineRecord>,
    pub status: OrderStatus,
    pub total: Money,
    pub delivery_address: String,
    pub contact_phone: String,
    pub delivery_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub updated_by: Option<UserId>,
}

/// Order aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    owner_id: UserId,
    items: Vec<OrderLine>,
    status: OrderStatus,
    total: Money,
    delivery: DeliveryDetails,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    estimated_delivery: DateTime<Utc>,
    updated_by: Option<UserId>,
}

impl Order {
    /// Rebuild a stored order, verifying line totals and the order total.
    pub fn restore(record: OrderRecord) -> Result<Self, OrderIntegrityError> {
        if record.items.is_empty() {
            return Err(OrderIntegrityError::NoLines);
        }
        let items = record
            .items
            .into_iter()
            .enumerate()
            .map(|(position, line)| OrderLine::restore(position, line))
            .collect::<Result<Vec<_>, _>>()?;
        let computed = Money::sum(items.iter().map(OrderLine::total_price))?;
        if computed != record.total {
            return Err(OrderIntegrityError::TotalMismatch {
                stored: record.total,
                computed,
            });
        }
        Ok(Self {
            id: record.id,
            owner_id: record.owner_id,
            items,
            status: record.status,
            total: record.total,
            delivery: DeliveryDetails::from_stored(
                record.delivery_address,
                record.contact_phone,
                record.delivery_notes,
            ),
            created_at: record.created_at,
            updated_at: record.updated_at,
            estimated_delivery: record.estimated_delivery,
            updated_by: record.updated_by,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn delivery(&self) -> &DeliveryDetails {
        &self.delivery
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn estimated_delivery(&self) -> DateTime<Utc> {
        self.estimated_delivery
    }

    /// Subject behind the most recent status transition.
    pub fn updated_by(&self) -> Option<&UserId> {
        self.updated_by.as_ref()
    }

    /// Apply a status change the store has already accepted.
    ///
    /// Used by in-process stores; SQL adapters reload the row instead.
    pub fn with_status_change(mut self, change: &StatusChange) -> Self {
        self.status = change.next;
        self.updated_at = change.at;
        self.updated_by = Some(change.actor.clone());
        self
    }
}

/// Compare-and-set request for an order's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub expected: OrderStatus,
    pub next: OrderStatus,
    pub actor: UserId,
    pub at: DateTime<Utc>,
}
