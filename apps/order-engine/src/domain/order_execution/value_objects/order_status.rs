//! Order status in the lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Local order status.
///
/// `Inactive` is used for TP/SL legs whose base order still rests on the
/// exchange. Exchange statuses are mapped onto this set by the adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Waiting for its base order to fill.
    Inactive,
    /// Live: resting on the exchange, or an armed TP/SL leg.
    Active,
    /// Partially filled on the exchange.
    PartFilled,
    /// Completely filled.
    Filled,
    /// Canceled.
    Canceled,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Canceled)
    }

    /// Returns true if the order is eligible for live evaluation.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Position in the forward lifecycle. Cancellation sits outside it.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
            Self::PartFilled => 2,
            Self::Filled | Self::Canceled => 3,
        }
    }

    /// Stored and displayed name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::PartFilled => "part_filled",
            Self::Filled => "filled",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(Self::Inactive),
            "active" => Ok(Self::Active),
            "part_filled" => Ok(Self::PartFilled),
            "filled" => Ok(Self::Filled),
            "canceled" => Ok(Self::Canceled),
            other => Err(DomainError::invalid(
                "status",
                format!("unknown order status '{other}'"),
            )),
        }
    }
}
