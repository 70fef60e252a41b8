//! Exact monetary amounts and line quantities.
//!
//! Amounts are `rust_decimal::Decimal` values so `unit_price × quantity` and
//! the order total never pass through binary floating point.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Smallest quantity accepted on an order line.
pub const MIN_QUANTITY: u32 = 1;
/// Largest quantity accepted on an order line.
pub const MAX_QUANTITY: u32 = 100;

/// Errors raised by money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    Negative { amount: Decimal },
    Overflow,
}

impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative { amount } => write!(f, "amount must not be negative: {amount}"),
            Self::Overflow => write!(f, "amount exceeds the supported decimal range"),
        }
    }
}

impl std::error::Error for MoneyError {}

/// Non-negative monetary amount in the store's single currency.
///
/// Serialises as a decimal string (`"41.96"`) so clients never round-trip the
/// value through a float.
///
/// # Examples
/// ```
/// use order_service::domain::{Money, Quantity};
/// use rust_decimal::Decimal;
///
/// let unit = Money::new(Decimal::new(399, 2)).expect("non-negative");
/// let line = unit.times(Quantity::new(3).expect("in range")).expect("no overflow");
/// assert_eq!(line.amount(), Decimal::new(1197, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate and wrap a decimal amount.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative { amount });
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    pub fn times(self, quantity: Quantity) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Exact sum of `amounts`; zero for an empty iterator.
    pub fn sum<I>(amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

/// Units of a product on one order line, within `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Returns `None` when `value` is outside `1..=100`.
    pub fn new(value: i64) -> Option<Self> {
        u32::try_from(value)
            .ok()
            .filter(|v| (MIN_QUANTITY..=MAX_QUANTITY).contains(v))
            .map(Self)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!("quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}, got {value}")
        })
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}
