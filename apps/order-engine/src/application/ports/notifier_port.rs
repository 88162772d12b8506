//! Notifier Port (Driven Port)
//!
//! Asynchronous user notifications about fired TP/SL legs. Delivery is
//! best-effort; callers log failures and carry on.

use std::fmt;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::order_execution::{OrderSide, TpSlRole};
use crate::domain::shared::{Exchange, ExchangeOrderId, OrderId, Symbol, UserId};

/// A message for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A leg fired and its exchange order was placed.
    TpSlExecuted {
        /// Leg role.
        role: TpSlRole,
        /// Side of the exchange order.
        side: OrderSide,
        /// Trade price that fired the leg.
        price: Decimal,
        /// Exchange id of the placed order.
        exec_order_id: ExchangeOrderId,
        /// Local id of the leg.
        order_id: OrderId,
        /// Venue.
        exchange: Exchange,
        /// Trading pair.
        symbol: Symbol,
        /// Quantity.
        quantity: Decimal,
    },
    /// A leg fired but could not be executed; it stays armed.
    TpSlFailed {
        /// Leg role.
        role: TpSlRole,
        /// Side of the exchange order.
        side: OrderSide,
        /// Trade price that fired the leg.
        price: Decimal,
        /// Trading pair.
        symbol: Symbol,
        /// User-facing reason.
        reason: String,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TpSlExecuted {
                role,
                side,
                price,
                exec_order_id,
                order_id,
                exchange,
                symbol,
                quantity,
            } => write!(
                f,
                "{} executed: {side} {quantity} {symbol} at {price} on {exchange} \
                 (exchange order {exec_order_id}, order {order_id})",
                role.as_str().to_uppercase()
            ),
            Self::TpSlFailed {
                role,
                side,
                price,
                symbol,
                reason,
            } => write!(
                f,
                "{} {side} {symbol} at {price} failed: {reason}",
                role.as_str().to_uppercase()
            ),
        }
    }
}

/// Notification delivery error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotifyError {
    /// Transport failed.
    #[error("Notification delivery failed: {message}")]
    DeliveryFailed {
        /// Error details.
        message: String,
    },
}

/// Port for user notifications.
#[async_trait]
pub trait NotifierPort: Send + Sync {
    /// Send a notification to a user.
    async fn notify(&self, user_id: UserId, notification: &Notification)
    -> Result<(), NotifyError>;
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl NotifierPort for NoOpNotifier {
    async fn notify(
        &self,
        _user_id: UserId,
        _notification: &Notification,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn executed_text() {
        let text = Notification::TpSlExecuted {
            role: TpSlRole::TakeProfit,
            side: OrderSide::Sell,
            price: dec!(33000.5),
            exec_order_id: ExchangeOrderId::new(991),
            order_id: OrderId::new(12),
            exchange: Exchange::Binance,
            symbol: Symbol::new("BTCUSDT"),
            quantity: dec!(0.25),
        }
        .to_string();
        assert_eq!(
            text,
            "TP executed: SELL 0.25 BTCUSDT at 33000.5 on binance (exchange order 991, order 12)"
        );
    }

    #[test]
    fn failed_text() {
        let text = Notification::TpSlFailed {
            role: TpSlRole::StopLoss,
            side: OrderSide::Buy,
            price: dec!(101),
            symbol: Symbol::new("ETHUSDT"),
            reason: "Insufficient balance".to_string(),
        }
        .to_string();
        assert_eq!(text, "SL BUY ETHUSDT at 101 failed: Insufficient balance");
    }

    #[tokio::test]
    async fn no_op_notifier_succeeds() {
        let notification = Notification::TpSlFailed {
            role: TpSlRole::StopLoss,
            side: OrderSide::Buy,
            price: dec!(1),
            symbol: Symbol::new("ETHUSDT"),
            reason: String::new(),
        };
        assert!(NoOpNotifier.notify(UserId::new(1), &notification).await.is_ok());
    }
}
