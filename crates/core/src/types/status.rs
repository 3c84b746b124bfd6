//! Order status with validated transitions.
//!
//! The underlying database column is TEXT; `OrderStatus` constrains it to the
//! five known states and rejects transitions that would move an order
//! backwards or out of a terminal state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order lifecycle status.
///
/// New orders start in `OnProgress` (checkout is payment-on-delivery in this
/// model, so there is no separate payment-pending gate before fulfillment
/// work begins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    #[default]
    OnProgress,
    Shipped,
    Done,
    Cancelled,
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl OrderStatus {
    /// Stable string form, matching the database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OnProgress => "on_progress",
            Self::Shipped => "shipped",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Forward-only: pending → on_progress → shipped → done, with
    /// cancellation possible until the order has shipped. `Done` and
    /// `Cancelled` are terminal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::OnProgress | Self::Cancelled)
                | (Self::OnProgress, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Done)
        )
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "on_progress" => Ok(Self::OnProgress),
            "shipped" => Ok(Self::Shipped),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::OnProgress,
            OrderStatus::Shipped,
            OrderStatus::Done,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert!("delivered".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::OnProgress));
        assert!(OrderStatus::OnProgress.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Done));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::OnProgress.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_and_backward_transitions_rejected() {
        assert!(!OrderStatus::Done.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::OnProgress));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::OnProgress));
        assert!(!OrderStatus::OnProgress.can_transition_to(OrderStatus::OnProgress));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::OnProgress).unwrap();
        assert_eq!(json, "\"on_progress\"");
        let back: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(back, OrderStatus::Shipped);
    }
}
