//! Limit Fill Ticker
//!
//! Polls the exchange for each resting base order and promotes it once the
//! exchange reports it filled.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{Evaluation, TickerConfig};
use crate::application::ports::OrderExecutionPort;
use crate::domain::order_execution::OrderStatus;
use crate::domain::shared::Exchange;
use crate::domain::stop_enforcement::{LiveOrder, OrdersQueue};
use crate::error::EngineError;

/// Periodic sweep over the resting base orders of one exchange.
pub struct LimitOrderTicker<E: OrderExecutionPort> {
    exchange: Exchange,
    queue: Arc<OrdersQueue>,
    executor: Arc<E>,
    config: TickerConfig,
}

impl<E: OrderExecutionPort + 'static> LimitOrderTicker<E> {
    /// Create the ticker. An empty queue is loaded once from the store.
    ///
    /// # Errors
    ///
    /// Returns error if the cold load fails.
    pub async fn new(
        queue: Arc<OrdersQueue>,
        executor: Arc<E>,
        config: TickerConfig,
    ) -> Result<Self, EngineError> {
        let exchange = queue.exchange();
        if queue.is_empty() {
            let orders = executor.limit_orders(exchange).await?;
            let count = orders.len();
            for order in orders {
                queue.add(order);
            }
            tracing::info!(exchange = %exchange, count, "Loaded resting limit orders");
        }

        Ok(Self {
            exchange,
            queue,
            executor,
            config,
        })
    }

    /// Queue this ticker sweeps.
    #[must_use]
    pub const fn queue(&self) -> &Arc<OrdersQueue> {
        &self.queue
    }

    /// Sweep every `interval` until `shutdown` fires.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(exchange = %self.exchange, "Limit order ticker started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!(exchange = %self.exchange, "Limit order ticker stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.sweep();
                }
            }
        }
    }

    /// Spawn one poll per queued order that is not already claimed.
    pub fn sweep(self: &Arc<Self>) -> Vec<JoinHandle<Evaluation>> {
        self.queue
            .snapshot()
            .into_iter()
            .filter(|live| !live.is_claimed())
            .map(|live| {
                let ticker = Arc::clone(self);
                tokio::spawn(async move { ticker.evaluate(live).await })
            })
            .collect()
    }

    /// Poll the exchange for one resting order.
    pub async fn evaluate(&self, live: Arc<LiveOrder>) -> Evaluation {
        let Some(_claim) = live.try_claim() else {
            return Evaluation::Busy;
        };

        let order = live.snapshot();
        if !matches!(order.status(), OrderStatus::Active | OrderStatus::PartFilled) {
            return Evaluation::Inactive;
        }

        let remote = match self.executor.exchange_order(&order).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id(),
                    exec_order_id = %order.exec_order_id(),
                    error = %e,
                    "Order status poll failed"
                );
                return Evaluation::Failed;
            }
        };

        if remote.is_closed() {
            return match self.executor.set_closed_limit_order(&order).await {
                Ok(true) => Evaluation::Closed,
                Ok(false) => Evaluation::AlreadyHandled,
                Err(e) => {
                    tracing::error!(order_id = %order.id(), error = %e, "Closing limit order failed");
                    Evaluation::Failed
                }
            };
        }

        if !remote.is_filled() {
            tracing::trace!(order_id = %order.id(), status = ?remote.status, "Not filled yet");
            return Evaluation::Waiting;
        }

        match self.executor.set_filled_limit_order(&order).await {
            Ok(true) => {
                tracing::info!(order_id = %order.id(), symbol = %order.symbol(), "Limit order filled");
                Evaluation::Filled
            }
            Ok(false) => Evaluation::AlreadyHandled,
            Err(e) => {
                tracing::error!(order_id = %order.id(), error = %e, "Fill promotion failed");
                Evaluation::Failed
            }
        }
    }
}

impl<E: OrderExecutionPort> std::fmt::Debug for LimitOrderTicker<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimitOrderTicker")
            .field("exchange", &self.exchange)
            .field("config", &self.config)
            .field("queued", &self.queue.order_count())
            .finish_non_exhaustive()
    }
}
