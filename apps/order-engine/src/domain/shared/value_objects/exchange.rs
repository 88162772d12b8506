//! Supported exchanges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// An exchange venue. Only Binance has an adapter today; the other names are
/// accepted so stored records and keys for them stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    /// Binance spot.
    Binance,
    /// KuCoin spot.
    Kucoin,
    /// OKX spot.
    Okx,
}

impl Exchange {
    /// Lowercase venue name as stored and used in cache keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Kucoin => "kucoin",
            Self::Okx => "okx",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "kucoin" => Ok(Self::Kucoin),
            "okx" => Ok(Self::Okx),
            other => Err(DomainError::invalid(
                "exchange",
                format!("unknown exchange '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Binance".parse::<Exchange>().unwrap(), Exchange::Binance);
        assert_eq!("OKX".parse::<Exchange>().unwrap(), Exchange::Okx);
        assert!("bitmex".parse::<Exchange>().is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&Exchange::Kucoin).unwrap(),
            "\"kucoin\""
        );
    }
}
