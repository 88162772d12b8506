//! Order Aggregate Root
//!
//! One exchange-facing order: a base order or one of its TP/SL legs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::services::OrderStateMachine;
use crate::domain::order_execution::value_objects::{
    OrderSide, OrderStatus, OrderType, TimeInForce, TpSlRole,
};
use crate::domain::shared::{Exchange, ExchangeOrderId, OrderId, Symbol, UserId};

/// An order that has not been stored yet, and the parameters used to
/// reconstitute a stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Owning user.
    pub user_id: UserId,
    /// Exchange id of the base order (for legs, the base they belong to).
    pub exec_order_id: ExchangeOrderId,
    /// Trading pair.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity in base asset units.
    pub quantity: Decimal,
    /// Limit price, fill price, or for legs the trigger price.
    pub price: Decimal,
    /// Time in force, for resting orders.
    pub time_in_force: Option<TimeInForce>,
    /// Stop price, for stop-loss-limit orders.
    pub stop_price: Option<Decimal>,
    /// Venue.
    pub exchange: Exchange,
    /// Initial status.
    pub status: OrderStatus,
    /// Base order or exit leg.
    pub role: TpSlRole,
}

impl NewOrder {
    /// Derive a TP/SL leg of this base order.
    ///
    /// The leg closes the position, so it trades on the opposite side.
    #[must_use]
    pub fn leg(
        &self,
        role: TpSlRole,
        trigger_price: Decimal,
        order_type: OrderType,
        status: OrderStatus,
    ) -> Self {
        Self {
            user_id: self.user_id,
            exec_order_id: self.exec_order_id,
            symbol: self.symbol.clone(),
            side: self.side.opposite(),
            order_type,
            quantity: self.quantity,
            price: trigger_price,
            time_in_force: order_type.requires_price().then_some(TimeInForce::Gtc),
            stop_price: None,
            exchange: self.exchange,
            status,
            role,
        }
    }

    /// Attach the store-assigned id.
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            exec_order_id: self.exec_order_id,
            fill_order_id: None,
            symbol: self.symbol,
            side: self.side,
            order_type: self.order_type,
            quantity: self.quantity,
            price: self.price,
            time_in_force: self.time_in_force,
            stop_price: self.stop_price,
            exchange: self.exchange,
            status: self.status,
            role: self.role,
        }
    }
}

/// Order Aggregate Root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    exec_order_id: ExchangeOrderId,
    fill_order_id: Option<ExchangeOrderId>,
    symbol: Symbol,
    side: OrderSide,
    order_type: OrderType,
    quantity: Decimal,
    price: Decimal,
    time_in_force: Option<TimeInForce>,
    stop_price: Option<Decimal>,
    exchange: Exchange,
    status: OrderStatus,
    role: TpSlRole,
}

impl Order {
    /// Reconstitute a stored order.
    #[must_use]
    pub fn restore(id: OrderId, params: NewOrder, fill_order_id: Option<ExchangeOrderId>) -> Self {
        let mut order = params.into_order(id);
        order.fill_order_id = fill_order_id;
        order
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Local id.
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Exchange id of the base order.
    #[must_use]
    pub const fn exec_order_id(&self) -> ExchangeOrderId {
        self.exec_order_id
    }

    /// Exchange id of the order a fired leg produced.
    #[must_use]
    pub const fn fill_order_id(&self) -> Option<ExchangeOrderId> {
        self.fill_order_id
    }

    /// Trading pair.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Quantity.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Price (trigger price for legs).
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Time in force.
    #[must_use]
    pub const fn time_in_force(&self) -> Option<TimeInForce> {
        self.time_in_force
    }

    /// Stop price.
    #[must_use]
    pub const fn stop_price(&self) -> Option<Decimal> {
        self.stop_price
    }

    /// Venue.
    #[must_use]
    pub const fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Role tag.
    #[must_use]
    pub const fn role(&self) -> TpSlRole {
        self.role
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    /// Overwrite the price (trigger price update, or observed trade price).
    pub fn set_price(&mut self, price: Decimal) {
        self.price = price;
    }

    /// Arm an inactive leg.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not inactive.
    pub fn activate(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Active)
    }

    /// Mark filled, optionally recording the exchange order a leg produced.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already terminal.
    pub fn fill(&mut self, fill_order_id: Option<ExchangeOrderId>) -> Result<(), OrderError> {
        self.transition(OrderStatus::Filled)?;
        if fill_order_id.is_some() {
            self.fill_order_id = fill_order_id;
        }
        Ok(())
    }

    /// Cancel.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::AlreadyClosed`] if the order is filled or canceled.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::AlreadyClosed {
                order_id: self.id.to_string(),
                status: self.status,
            });
        }
        self.transition(OrderStatus::Canceled)
    }

    fn transition(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, to)?;
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base() -> NewOrder {
        NewOrder {
            user_id: UserId::new(7),
            exec_order_id: ExchangeOrderId::new(5001),
            symbol: Symbol::new("BTCUSDT"),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: dec!(0.5),
            price: dec!(30000),
            time_in_force: Some(TimeInForce::Gtc),
            stop_price: None,
            exchange: Exchange::Binance,
            status: OrderStatus::Active,
            role: TpSlRole::Base,
        }
    }

    #[test]
    fn leg_trades_opposite_side_and_references_base() {
        let leg = base().leg(
            TpSlRole::TakeProfit,
            dec!(33000),
            OrderType::Market,
            OrderStatus::Inactive,
        );
        assert_eq!(leg.side, OrderSide::Sell);
        assert_eq!(leg.exec_order_id, ExchangeOrderId::new(5001));
        assert_eq!(leg.role, TpSlRole::TakeProfit);
        assert_eq!(leg.price, dec!(33000));
        assert_eq!(leg.time_in_force, None);
        assert_eq!(leg.quantity, dec!(0.5));
    }

    #[test]
    fn limit_leg_gets_gtc() {
        let leg = base().leg(
            TpSlRole::StopLoss,
            dec!(29000),
            OrderType::Limit,
            OrderStatus::Active,
        );
        assert_eq!(leg.time_in_force, Some(TimeInForce::Gtc));
    }

    #[test]
    fn into_order_keeps_fields() {
        let order = base().into_order(OrderId::new(11));
        assert_eq!(order.id(), OrderId::new(11));
        assert_eq!(order.symbol().as_str(), "BTCUSDT");
        assert_eq!(order.fill_order_id(), None);
        assert_eq!(order.status(), OrderStatus::Active);
    }

    #[test]
    fn fill_records_exchange_id() {
        let mut order = base().into_order(OrderId::new(1));
        order.fill(Some(ExchangeOrderId::new(9))).unwrap();
        assert_eq!(order.status(), OrderStatus::Filled);
        assert_eq!(order.fill_order_id(), Some(ExchangeOrderId::new(9)));
    }

    #[test]
    fn cancel_is_terminal() {
        let mut order = base().into_order(OrderId::new(1));
        order.cancel().unwrap();
        assert!(matches!(
            order.cancel(),
            Err(OrderError::AlreadyClosed { .. })
        ));
        assert!(order.fill(None).is_err());
    }

    #[test]
    fn activate_requires_inactive() {
        let mut params = base();
        params.status = OrderStatus::Inactive;
        let mut order = params.into_order(OrderId::new(2));
        order.activate().unwrap();
        assert_eq!(order.status(), OrderStatus::Active);
        assert!(order.activate().is_err());
    }

    #[test]
    fn restore_keeps_fill_id() {
        let order = Order::restore(OrderId::new(3), base(), Some(ExchangeOrderId::new(77)));
        assert_eq!(order.fill_order_id(), Some(ExchangeOrderId::new(77)));
    }
}
