//! Listing filters and visibility scope for order scans.

use std::fmt;

use chrono::{DateTime, Utc};
use pagination::PageRequest;

use super::money::Money;
use super::order::Order;
use super::status::OrderStatus;
use crate::domain::{Principal, UserId};

/// Inverted ranges rejected before any query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderFilterError {
    InvertedDateRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    InvertedTotalRange {
        min: Money,
        max: Money,
    },
}

impl fmt::Display for OrderFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedDateRange { from, to } => write!(
                f,
                "from_date ({}) must not be after to_date ({})",
                from.to_rfc3339(),
                to.to_rfc3339()
            ),
            Self::InvertedTotalRange { min, max } => {
                write!(f, "min_total ({min}) must not exceed max_total ({max})")
            }
        }
    }
}

impl std::error::Error for OrderFilterError {}

/// Optional list filters. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListFilter {
    status: Option<OrderStatus>,
    created_from: Option<DateTime<Utc>>,
    created_to: Option<DateTime<Utc>>,
    min_total: Option<Money>,
    max_total: Option<Money>,
}

impl OrderListFilter {
    /// Build a filter, rejecting inverted ranges.
    pub fn new(
        status: Option<OrderStatus>,
        created_from: Option<DateTime<Utc>>,
        created_to: Option<DateTime<Utc>>,
        min_total: Option<Money>,
        max_total: Option<Money>,
    ) -> Result<Self, OrderFilterError> {
        if let (Some(from), Some(to)) = (created_from, created_to)
            && from > to
        {
            return Err(OrderFilterError::InvertedDateRange { from, to });
        }
        if let (Some(min), Some(max)) = (min_total, max_total)
            && min > max
        {
            return Err(OrderFilterError::InvertedTotalRange { min, max });
        }
        Ok(Self {
            status,
            created_from,
            created_to,
            min_total,
            max_total,
        })
    }

    pub fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.created_from
    }

    pub fn created_to(&self) -> Option<DateTime<Utc>> {
        self.created_to
    }

    pub fn min_total(&self) -> Option<Money> {
        self.min_total
    }

    pub fn max_total(&self) -> Option<Money> {
        self.max_total
    }

    /// In-process evaluation, mirroring the SQL predicate.
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|status| order.status() == status)
            && self.created_from.is_none_or(|from| order.created_at() >= from)
            && self.created_to.is_none_or(|to| order.created_at() <= to)
            && self.min_total.is_none_or(|min| order.total() >= min)
            && self.max_total.is_none_or(|max| order.total() <= max)
    }
}

/// Which orders a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    Owner(UserId),
    All,
}

impl OrderScope {
    /// Customers see their own orders; elevated roles see everything.
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.is_elevated() {
            Self::All
        } else {
            Self::Owner(principal.subject().clone())
        }
    }

    pub fn admits(&self, order: &Order) -> bool {
        match self {
            Self::Owner(owner) => order.owner_id() == owner,
            Self::All => true,
        }
    }
}

/// A complete scan request handed to the repository.
///
/// Results are ordered by `created_at` descending, then id descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSearch {
    pub scope: OrderScope,
    pub filter: OrderListFilter,
    pub page: PageRequest,
}

#[cfg(test)]
mod tests {
    //! Filter construction and scope rules.

    use super::*;
    use crate::domain::Role;
    use chrono::Duration;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount).expect("money")
    }

    #[rstest]
    fn inverted_total_range_is_rejected() {
        let result = OrderListFilter::new(
            None,
            None,
            None,
            Some(money(dec!(50))),
            Some(money(dec!(10))),
        );
        assert!(matches!(
            result,
            Err(OrderFilterError::InvertedTotalRange { .. })
        ));
    }

    #[rstest]
    fn inverted_date_range_is_rejected() {
        let to = Utc::now();
        let from = to + Duration::days(1);
        let result = OrderListFilter::new(None, Some(from), Some(to), None, None);
        assert!(matches!(
            result,
            Err(OrderFilterError::InvertedDateRange { .. })
        ));
    }

    #[rstest]
    fn equal_bounds_are_accepted() {
        let at = Utc::now();
        let price = money(dec!(20));
        assert!(OrderListFilter::new(None, Some(at), Some(at), Some(price), Some(price)).is_ok());
    }

    #[rstest]
    #[case(Role::Customer, false)]
    #[case(Role::Seller, true)]
    #[case(Role::Admin, true)]
    fn scope_follows_role(#[case] role: Role, #[case] sees_all: bool) {
        let principal = Principal::new(UserId::random(), role, Utc::now());
        let scope = OrderScope::for_principal(&principal);
        assert_eq!(scope == OrderScope::All, sees_all);
    }
}
