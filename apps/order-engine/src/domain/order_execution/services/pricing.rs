//! Pricing rules: stop-limit derivation and TP/SL trigger prices.
//!
//! All arithmetic is exact decimal arithmetic; `price ± price * percent / 100`.

use rust_decimal::Decimal;

use crate::domain::order_execution::aggregate::LegSpec;
use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::value_objects::{OrderSide, TpSlRole};

/// Ensure a percentage lies in `[0, 100]`.
///
/// # Errors
///
/// Returns [`OrderError::PercentOutOfRange`] otherwise.
pub fn check_percent(field: &str, value: Decimal) -> Result<(), OrderError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(OrderError::PercentOutOfRange {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Move `price` up (`raise = true`) or down by `percent` percent.
#[must_use]
pub fn shift_by_percent(price: Decimal, percent: Decimal, raise: bool) -> Decimal {
    let delta = price * percent / Decimal::ONE_HUNDRED;
    let shifted = if raise { price + delta } else { price - delta };
    shifted.normalize()
}

/// Effective limit price of a stop-loss-limit order.
///
/// Buy orders are priced `percent` above the stop price, sell orders below it.
///
/// # Errors
///
/// Returns an error if `stop_percent` is outside `[0, 100]`.
pub fn stop_limit_price(
    stop_price: Decimal,
    stop_percent: Decimal,
    side: OrderSide,
) -> Result<Decimal, OrderError> {
    check_percent("stopPercent", stop_percent)?;
    Ok(shift_by_percent(
        stop_price,
        stop_percent,
        side == OrderSide::Buy,
    ))
}

/// Trigger price of a TP/SL leg for a base order filled at `base_price`.
///
/// An absolute price wins over a percent. Take-profit sits on the profitable
/// side of the entry (above it for a long), stop-loss on the losing side.
/// Returns `None` when the leg is empty.
#[must_use]
pub fn leg_trigger_price(
    base_price: Decimal,
    base_side: OrderSide,
    role: TpSlRole,
    spec: &LegSpec,
) -> Option<Decimal> {
    if let Some(price) = spec.price {
        return Some(price);
    }
    let percent = spec.percent?;
    let long = base_side == OrderSide::Buy;
    let raise = match role {
        TpSlRole::TakeProfit => long,
        TpSlRole::StopLoss => !long,
        TpSlRole::Base => return None,
    };
    Some(shift_by_percent(base_price, percent, raise))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stop_limit_buy_raises_price() {
        let price = stop_limit_price(dec!(100), dec!(5), OrderSide::Buy).unwrap();
        assert_eq!(price, dec!(105));
        assert_eq!(price.to_string(), "105");
    }

    #[test]
    fn stop_limit_sell_lowers_price() {
        let price = stop_limit_price(dec!(100), dec!(5), OrderSide::Sell).unwrap();
        assert_eq!(price, dec!(95));
        assert_eq!(price.to_string(), "95");
    }

    #[test]
    fn stop_limit_rejects_out_of_range_percent() {
        assert!(stop_limit_price(dec!(100), dec!(100.01), OrderSide::Buy).is_err());
        assert!(stop_limit_price(dec!(100), dec!(-1), OrderSide::Sell).is_err());
        assert!(stop_limit_price(dec!(100), dec!(0), OrderSide::Sell).is_ok());
        assert!(stop_limit_price(dec!(100), dec!(100), OrderSide::Sell).is_ok());
    }

    #[test]
    fn fractional_prices_stay_exact() {
        let price = stop_limit_price(dec!(0.1), dec!(10), OrderSide::Buy).unwrap();
        assert_eq!(price, dec!(0.11));
    }

    #[test]
    fn long_legs_bracket_entry() {
        let tp = LegSpec::percent(dec!(10));
        let sl = LegSpec::percent(dec!(5));
        assert_eq!(
            leg_trigger_price(dec!(200), OrderSide::Buy, TpSlRole::TakeProfit, &tp),
            Some(dec!(220))
        );
        assert_eq!(
            leg_trigger_price(dec!(200), OrderSide::Buy, TpSlRole::StopLoss, &sl),
            Some(dec!(190))
        );
    }

    #[test]
    fn short_legs_bracket_entry() {
        let tp = LegSpec::percent(dec!(10));
        let sl = LegSpec::percent(dec!(5));
        assert_eq!(
            leg_trigger_price(dec!(200), OrderSide::Sell, TpSlRole::TakeProfit, &tp),
            Some(dec!(180))
        );
        assert_eq!(
            leg_trigger_price(dec!(200), OrderSide::Sell, TpSlRole::StopLoss, &sl),
            Some(dec!(210))
        );
    }

    #[test]
    fn absolute_price_wins_over_percent() {
        let spec = LegSpec {
            percent: Some(dec!(10)),
            price: Some(dec!(250.5)),
            order_type: None,
        };
        assert_eq!(
            leg_trigger_price(dec!(200), OrderSide::Buy, TpSlRole::TakeProfit, &spec),
            Some(dec!(250.5))
        );
    }

    #[test]
    fn empty_leg_has_no_price() {
        assert_eq!(
            leg_trigger_price(
                dec!(200),
                OrderSide::Buy,
                TpSlRole::StopLoss,
                &LegSpec::default()
            ),
            None
        );
    }
}
