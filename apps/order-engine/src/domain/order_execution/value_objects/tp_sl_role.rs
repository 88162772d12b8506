//! Role tag distinguishing base orders from their TP/SL legs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Whether an order is a user-placed base order or one of its exit legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TpSlRole {
    /// The order the user placed.
    #[serde(rename = "base")]
    Base,
    /// Take-profit leg.
    #[serde(rename = "tp")]
    TakeProfit,
    /// Stop-loss leg.
    #[serde(rename = "sl")]
    StopLoss,
}

impl TpSlRole {
    /// Returns true for TP and SL legs.
    #[must_use]
    pub const fn is_leg(&self) -> bool {
        !matches!(self, Self::Base)
    }

    /// The sibling leg role. `None` for base orders.
    #[must_use]
    pub const fn opposite(&self) -> Option<Self> {
        match self {
            Self::Base => None,
            Self::TakeProfit => Some(Self::StopLoss),
            Self::StopLoss => Some(Self::TakeProfit),
        }
    }

    /// Stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::TakeProfit => "tp",
            Self::StopLoss => "sl",
        }
    }
}

impl fmt::Display for TpSlRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TpSlRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Self::Base),
            "tp" => Ok(Self::TakeProfit),
            "sl" => Ok(Self::StopLoss),
            other => Err(DomainError::invalid(
                "tp_sl",
                format!("unknown role '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_pairs_legs() {
        assert_eq!(TpSlRole::TakeProfit.opposite(), Some(TpSlRole::StopLoss));
        assert_eq!(TpSlRole::StopLoss.opposite(), Some(TpSlRole::TakeProfit));
        assert_eq!(TpSlRole::Base.opposite(), None);
    }

    #[test]
    fn legs() {
        assert!(TpSlRole::TakeProfit.is_leg());
        assert!(!TpSlRole::Base.is_leg());
    }

    #[test]
    fn parse() {
        assert_eq!("sl".parse::<TpSlRole>().unwrap(), TpSlRole::StopLoss);
        assert!("trail".parse::<TpSlRole>().is_err());
    }
}
