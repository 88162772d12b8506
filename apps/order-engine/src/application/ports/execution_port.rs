//! Order Execution Port (Driver Port)
//!
//! What the periodic tickers need from the execution service.

use async_trait::async_trait;

use super::exchange_port::ExchangeOrder;
use crate::domain::order_execution::Order;
use crate::domain::shared::{Exchange, ExchangeOrderId, UserId};
use crate::error::EngineError;

/// Result of asking to execute a TP/SL leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The leg's exchange order was placed with this id.
    Executed(ExchangeOrderId),
    /// The leg was no longer queued; another evaluation handled it.
    AlreadyHandled,
}

/// Port driving order execution from the tickers.
#[async_trait]
pub trait OrderExecutionPort: Send + Sync {
    /// Active TP/SL legs, for the cold load of the TP/SL queue.
    async fn active_tp_sl_orders(&self, exchange: Exchange) -> Result<Vec<Order>, EngineError>;

    /// Active resting base orders, for the cold load of the limit queue.
    async fn limit_orders(&self, exchange: Exchange) -> Result<Vec<Order>, EngineError>;

    /// Fire a TP/SL leg whose price has been set to the observed trade price.
    async fn execute_tp_sl_order(
        &self,
        user_id: UserId,
        order: &Order,
    ) -> Result<ExecutionOutcome, EngineError>;

    /// The exchange's view of a base order.
    async fn exchange_order(&self, order: &Order) -> Result<ExchangeOrder, EngineError>;

    /// Promote a filled resting order and arm its legs. Returns false if the
    /// order was no longer queued.
    async fn set_filled_limit_order(&self, order: &Order) -> Result<bool, EngineError>;

    /// Record a resting order the exchange closed without a fill, canceling
    /// its legs. Returns false if the order was no longer queued.
    async fn set_closed_limit_order(&self, order: &Order) -> Result<bool, EngineError>;
}
