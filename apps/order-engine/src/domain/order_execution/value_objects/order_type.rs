//! Order types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Executes immediately at the best available price.
    Market,
    /// Rests on the book at a limit price.
    Limit,
    /// Limit order armed when the stop price trades.
    StopLossLimit,
}

impl OrderType {
    /// Returns true if the order rests on the exchange until filled.
    #[must_use]
    pub const fn is_resting(&self) -> bool {
        matches!(self, Self::Limit | Self::StopLossLimit)
    }

    /// Returns true if the exchange needs an explicit price.
    #[must_use]
    pub const fn requires_price(&self) -> bool {
        matches!(self, Self::Limit | Self::StopLossLimit)
    }

    /// Returns true if a stop price and percent are required.
    #[must_use]
    pub const fn requires_stop(&self) -> bool {
        matches!(self, Self::StopLossLimit)
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
            Self::StopLossLimit => "STOP_LOSS_LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MARKET" => Ok(Self::Market),
            "LIMIT" => Ok(Self::Limit),
            "STOP_LOSS_LIMIT" => Ok(Self::StopLossLimit),
            other => Err(DomainError::invalid(
                "type",
                format!("unknown order type '{other}'"),
            )),
        }
    }
}
