//! Order status state machine.
//!
//! ```text
//! Pending ──► Confirmed ──► Preparing ──► Ready ──► Completed
//!    │            │
//!    └────────────┴──► Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. Customers may cancel only while
//! the order is `Pending` or `Confirmed`; the same two states are the only
//! ones with a `Cancelled` edge, so the cancel path and the generic path
//! agree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

/// A requested transition that the state machine forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransitionError {
    NotAllowed {
        from: OrderStatus,
        to: OrderStatus,
    },
    NotCancellable {
        from: OrderStatus,
    },
}

impl fmt::Display for StatusTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed { from, to } => {
                write!(f, "cannot transition order from {from} to {to}")
            }
            Self::NotCancellable { from } => write!(
                f,
                "cannot cancel order in status {from}; only pending or confirmed orders can be cancelled",
            ),
        }
    }
}

impl std::error::Error for StatusTransitionError {}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOrderStatusError {
    value: String,
}

impl fmt::Display for ParseOrderStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order status: {}", self.value)
    }
}

impl std::error::Error for ParseOrderStatusError {}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Statuses reachable in one step.
    pub fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Preparing, Self::Cancelled],
            Self::Preparing => &[Self::Ready],
            Self::Ready => &[Self::Completed],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    /// Validate a move along the generic transition table.
    pub fn transition_to(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError::NotAllowed {
                from: self,
                to: next,
            })
        }
    }

    /// Validate a customer-initiated cancellation.
    pub fn cancel(self) -> Result<Self, StatusTransitionError> {
        match self {
            Self::Pending | Self::Confirmed => Ok(Self::Cancelled),
            from => Err(StatusTransitionError::NotCancellable { from }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseOrderStatusError {
                value: value.to_owned(),
            })
    }
}
