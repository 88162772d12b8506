//! TP/SL settings attached to a base order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::value_objects::{OrderType, TpSlRole};
use crate::domain::shared::OrderId;

/// Configuration of one exit leg.
///
/// A leg is empty when neither percent nor price is set. When both are set
/// the price is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegSpec {
    /// Distance from the entry price, in percent.
    pub percent: Option<Decimal>,
    /// Absolute trigger price.
    pub price: Option<Decimal>,
    /// Order type sent to the exchange when the leg fires. Market if unset.
    pub order_type: Option<OrderType>,
}

impl LegSpec {
    /// Leg defined by a percent.
    #[must_use]
    pub const fn percent(percent: Decimal) -> Self {
        Self {
            percent: Some(percent),
            price: None,
            order_type: None,
        }
    }

    /// Leg defined by an absolute price.
    #[must_use]
    pub const fn price(price: Decimal) -> Self {
        Self {
            percent: None,
            price: Some(price),
            order_type: None,
        }
    }

    /// Returns true if neither percent nor price is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.percent.is_none() && self.price.is_none()
    }

    /// Order type to use when the leg fires.
    #[must_use]
    pub fn execution_type(&self) -> OrderType {
        self.order_type.unwrap_or(OrderType::Market)
    }

    /// Replace the trigger definition with `update` when it is not empty.
    ///
    /// The order-type override is kept unless the update carries one.
    pub fn apply(&mut self, update: &Self) {
        if update.is_empty() {
            return;
        }
        self.percent = update.percent;
        self.price = update.price;
        if update.order_type.is_some() {
            self.order_type = update.order_type;
        }
    }
}

/// TP/SL settings, one row per base order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base order these settings belong to. Unset until the base is stored.
    pub order_id: OrderId,
    /// Take-profit leg.
    pub take_profit: LegSpec,
    /// Stop-loss leg.
    pub stop_loss: LegSpec,
    /// Trailing-stop distance. Stored with the settings, not evaluated.
    pub trailing_stop: Option<Decimal>,
}

impl Settings {
    /// Returns true if no take-profit is configured.
    #[must_use]
    pub const fn is_tp_empty(&self) -> bool {
        self.take_profit.is_empty()
    }

    /// Returns true if no stop-loss is configured.
    #[must_use]
    pub const fn is_sl_empty(&self) -> bool {
        self.stop_loss.is_empty()
    }

    /// Returns true if neither leg is configured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.is_tp_empty() && self.is_sl_empty()
    }

    /// Spec of the given leg. `None` for [`TpSlRole::Base`].
    #[must_use]
    pub const fn leg(&self, role: TpSlRole) -> Option<&LegSpec> {
        match role {
            TpSlRole::TakeProfit => Some(&self.take_profit),
            TpSlRole::StopLoss => Some(&self.stop_loss),
            TpSlRole::Base => None,
        }
    }

    /// Configured legs, take-profit first.
    pub fn configured_legs(&self) -> impl Iterator<Item = (TpSlRole, &LegSpec)> {
        [
            (TpSlRole::TakeProfit, &self.take_profit),
            (TpSlRole::StopLoss, &self.stop_loss),
        ]
        .into_iter()
        .filter(|(_, spec)| !spec.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_iff_both_fields_missing() {
        assert!(LegSpec::default().is_empty());
        assert!(!LegSpec::percent(dec!(1)).is_empty());
        assert!(!LegSpec::price(dec!(1)).is_empty());
    }

    #[test]
    fn settings_emptiness() {
        let settings = Settings {
            take_profit: LegSpec::percent(dec!(3)),
            ..Settings::default()
        };
        assert!(!settings.is_tp_empty());
        assert!(settings.is_sl_empty());
        assert!(!settings.is_empty());
        assert!(Settings::default().is_empty());
    }

    #[test]
    fn configured_legs_skips_empty() {
        let settings = Settings {
            stop_loss: LegSpec::price(dec!(90)),
            ..Settings::default()
        };
        let legs: Vec<_> = settings.configured_legs().map(|(role, _)| role).collect();
        assert_eq!(legs, vec![TpSlRole::StopLoss]);
    }

    #[test]
    fn apply_keeps_type_override() {
        let mut spec = LegSpec {
            percent: Some(dec!(5)),
            price: None,
            order_type: Some(OrderType::Limit),
        };
        spec.apply(&LegSpec::price(dec!(120)));
        assert_eq!(spec.price, Some(dec!(120)));
        assert_eq!(spec.percent, None);
        assert_eq!(spec.execution_type(), OrderType::Limit);
    }

    #[test]
    fn apply_ignores_empty_update() {
        let mut spec = LegSpec::percent(dec!(5));
        spec.apply(&LegSpec::default());
        assert_eq!(spec, LegSpec::percent(dec!(5)));
    }

    #[test]
    fn execution_type_defaults_to_market() {
        assert_eq!(LegSpec::default().execution_type(), OrderType::Market);
    }
}
