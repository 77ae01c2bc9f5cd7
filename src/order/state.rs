//! Order lifecycle states
//!
//! ```text
//! NEW ──▶ PROCESSING ──▶ INVALID   (terminal)
//!  │            └──────▶ PROCESSED (terminal, ledger credited once)
//!  └──────────────────▶ INVALID / PROCESSED
//! ```
//!
//! Status strings match the `orders_tb.status` column and the public API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Uploaded, not yet seen by the accrual service
    New,
    /// Accrual service is still computing
    Processing,
    /// Terminal: accrual service rejected the order
    Invalid,
    /// Terminal: accrual computed and credited
    Processed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::New,
        OrderStatus::Processing,
        OrderStatus::Invalid,
        OrderStatus::Processed,
    ];

    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Invalid | OrderStatus::Processed)
    }

    /// Forward-rank along the lifecycle. Terminal states share the top rank.
    #[inline]
    fn rank(&self) -> u8 {
        match self {
            OrderStatus::New => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Invalid | OrderStatus::Processed => 2,
        }
    }

    /// Whether `self -> next` is a legal forward move.
    ///
    /// Staying in place is not a transition.
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// States from which `self` may be entered
    pub fn predecessors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::New => &[],
            OrderStatus::Processing => &[OrderStatus::New],
            OrderStatus::Invalid | OrderStatus::Processed => {
                &[OrderStatus::New, OrderStatus::Processing]
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "INVALID" => Ok(OrderStatus::Invalid),
            "PROCESSED" => Ok(OrderStatus::Processed),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Invalid.is_terminal());
        assert!(OrderStatus::Processed.is_terminal());

        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn test_forward_transitions() {
        use OrderStatus::*;

        assert!(New.can_advance_to(Processing));
        assert!(New.can_advance_to(Invalid));
        assert!(New.can_advance_to(Processed));
        assert!(Processing.can_advance_to(Invalid));
        assert!(Processing.can_advance_to(Processed));
    }

    #[test]
    fn test_no_backward_or_terminal_exit() {
        use OrderStatus::*;

        for to in OrderStatus::ALL {
            assert!(!Invalid.can_advance_to(to), "INVALID -> {}", to);
            assert!(!Processed.can_advance_to(to), "PROCESSED -> {}", to);
        }
        assert!(!Processing.can_advance_to(New));
        assert!(!Processing.can_advance_to(Processing));
        assert!(!New.can_advance_to(New));
    }

    #[test]
    fn test_predecessors_agree_with_can_advance() {
        for to in OrderStatus::ALL {
            for from in OrderStatus::ALL {
                assert_eq!(
                    to.predecessors().contains(&from),
                    from.can_advance_to(to),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_string_roundtrip_and_unknown() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("REGISTERED".parse::<OrderStatus>().is_err());
        assert!("new".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
    }
}
