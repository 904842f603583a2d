//! Order status state machine.
//!
//! An order starts as [`OrderStatus::Pending`] inside the checkout
//! transaction, before any payment session exists. The checkout orchestrator
//! advances it to `PendingPayment` after a successful gateway call, or to
//! `Failed` as the compensating transition when the gateway call fails.
//! `Paid` and `Cancelled` are driven by external confirmation flows.
//! Terminal states admit no further transitions.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created by the checkout transaction; no payment session yet.
    #[default]
    Pending,
    /// A payment session exists; awaiting external confirmation.
    PendingPayment,
    /// Payment confirmed (terminal).
    Paid,
    /// Payment session creation or a downstream step failed (terminal).
    Failed,
    /// Cancelled by an external trigger (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed | Self::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::PendingPayment | Self::Failed),
            Self::PendingPayment => matches!(next, Self::Paid | Self::Failed | Self::Cancelled),
            Self::Paid | Self::Failed | Self::Cancelled => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::PendingPayment => write!(f, "pending_payment"),
            Self::Paid => write!(f, "paid"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pending_payment" => Ok(Self::PendingPayment),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_session_or_failure() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::PendingPayment));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Failed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states_admit_no_exit() {
        for terminal in [OrderStatus::Paid, OrderStatus::Failed, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                OrderStatus::Pending,
                OrderStatus::PendingPayment,
                OrderStatus::Paid,
                OrderStatus::Failed,
                OrderStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::PendingPayment,
            OrderStatus::Paid,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
