//! Account balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Holding of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    /// Asset ticker, e.g. `BTC`.
    pub symbol: String,
    /// Free amount.
    pub quantity: Decimal,
}

/// All holdings of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Vec<AssetBalance>);

impl Balance {
    /// Drop zero holdings.
    #[must_use]
    pub fn non_zero(self) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|asset| !asset.quantity.is_zero())
                .collect(),
        )
    }

    /// Holding of an asset, if any.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&AssetBalance> {
        self.0.iter().find(|asset| asset.symbol == symbol)
    }

    /// Number of assets listed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no asset is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn non_zero_filters_dust_free_assets() {
        let balance = Balance(vec![
            AssetBalance {
                symbol: "BTC".to_string(),
                quantity: dec!(0.5),
            },
            AssetBalance {
                symbol: "ETH".to_string(),
                quantity: dec!(0.000),
            },
        ])
        .non_zero();
        assert_eq!(balance.len(), 1);
        assert_eq!(balance.get("BTC").unwrap().quantity, dec!(0.5));
        assert!(balance.get("ETH").is_none());
    }
}
