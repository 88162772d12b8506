//! TP/SL trigger rule.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::domain::order_execution::{OrderSide, TpSlRole};

/// Decides whether a leg fires at the observed trade price.
///
/// | Side | Role | Fires when                  |
/// |------|------|-----------------------------|
/// | buy  | tp   | trade price <= trigger      |
/// | sell | tp   | trade price >= trigger      |
/// | sell | sl   | trade price <= trigger      |
/// | buy  | sl   | trade price >= trigger      |
///
/// Comparison is exact decimal comparison.
pub struct TriggerRule;

impl TriggerRule {
    /// Returns true if the leg should fire. Base orders never fire.
    #[must_use]
    pub fn should_fire(
        side: OrderSide,
        role: TpSlRole,
        trade_price: Decimal,
        trigger_price: Decimal,
    ) -> bool {
        let cmp = trade_price.cmp(&trigger_price);
        match (side, role) {
            (OrderSide::Buy, TpSlRole::TakeProfit) | (OrderSide::Sell, TpSlRole::StopLoss) => {
                cmp != Ordering::Greater
            }
            (OrderSide::Sell, TpSlRole::TakeProfit) | (OrderSide::Buy, TpSlRole::StopLoss) => {
                cmp != Ordering::Less
            }
            (_, TpSlRole::Base) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case(OrderSide::Buy, TpSlRole::TakeProfit, dec!(99), true ; "buy tp below")]
    #[test_case(OrderSide::Buy, TpSlRole::TakeProfit, dec!(100), true ; "buy tp at")]
    #[test_case(OrderSide::Buy, TpSlRole::TakeProfit, dec!(101), false ; "buy tp above")]
    #[test_case(OrderSide::Sell, TpSlRole::TakeProfit, dec!(99), false ; "sell tp below")]
    #[test_case(OrderSide::Sell, TpSlRole::TakeProfit, dec!(100), true ; "sell tp at")]
    #[test_case(OrderSide::Sell, TpSlRole::TakeProfit, dec!(101), true ; "sell tp above")]
    #[test_case(OrderSide::Sell, TpSlRole::StopLoss, dec!(99), true ; "sell sl below")]
    #[test_case(OrderSide::Sell, TpSlRole::StopLoss, dec!(100), true ; "sell sl at")]
    #[test_case(OrderSide::Sell, TpSlRole::StopLoss, dec!(101), false ; "sell sl above")]
    #[test_case(OrderSide::Buy, TpSlRole::StopLoss, dec!(99), false ; "buy sl below")]
    #[test_case(OrderSide::Buy, TpSlRole::StopLoss, dec!(100), true ; "buy sl at")]
    #[test_case(OrderSide::Buy, TpSlRole::StopLoss, dec!(101), true ; "buy sl above")]
    fn rule_table(side: OrderSide, role: TpSlRole, trade: Decimal, expected: bool) {
        assert_eq!(
            TriggerRule::should_fire(side, role, trade, dec!(100)),
            expected
        );
    }

    #[test]
    fn base_orders_never_fire() {
        assert!(!TriggerRule::should_fire(
            OrderSide::Buy,
            TpSlRole::Base,
            dec!(1),
            dec!(1)
        ));
    }

    #[test]
    fn textual_decimals_compare_exactly() {
        let sum = Decimal::from_str("0.1").unwrap() + Decimal::from_str("0.2").unwrap();
        let trigger = Decimal::from_str("0.3").unwrap();
        assert_eq!(sum, trigger);
        // An f64 sum is 0.30000000000000004 and would miss the boundary.
        assert!(TriggerRule::should_fire(
            OrderSide::Buy,
            TpSlRole::TakeProfit,
            sum,
            trigger
        ));
        assert!(TriggerRule::should_fire(
            OrderSide::Sell,
            TpSlRole::StopLoss,
            sum,
            trigger
        ));
    }

    #[test]
    fn trailing_zeros_do_not_matter() {
        let trade = Decimal::from_str("100.000").unwrap();
        assert!(TriggerRule::should_fire(
            OrderSide::Sell,
            TpSlRole::TakeProfit,
            trade,
            dec!(100)
        ));
        assert!(!TriggerRule::should_fire(
            OrderSide::Sell,
            TpSlRole::TakeProfit,
            Decimal::from_str("99.99999999").unwrap(),
            dec!(100)
        ));
    }

    proptest! {
        #[test]
        fn tp_and_sl_of_same_side_agree_only_at_trigger(
            trade in 1i64..1_000_000,
            trigger in 1i64..1_000_000,
            scale in 0u32..8,
        ) {
            let trade = Decimal::new(trade, scale);
            let trigger = Decimal::new(trigger, scale);
            for side in [OrderSide::Buy, OrderSide::Sell] {
                let tp = TriggerRule::should_fire(side, TpSlRole::TakeProfit, trade, trigger);
                let sl = TriggerRule::should_fire(side, TpSlRole::StopLoss, trade, trigger);
                prop_assert!(tp || sl);
                prop_assert_eq!(tp && sl, trade == trigger);
            }
        }
    }
}
