//! TP/SL Trigger Ticker
//!
//! Compares the cached trade price with each armed leg's trigger price and
//! fires the leg through the execution port.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{Evaluation, TickerConfig};
use crate::application::ports::{
    ExecutionOutcome, Notification, NotifierPort, OrderExecutionPort, PriceCachePort,
};
use crate::domain::order_execution::Order;
use crate::domain::shared::{Exchange, UserId};
use crate::domain::stop_enforcement::{LiveOrder, OrdersQueue, TriggerRule};
use crate::error::EngineError;

/// Periodic sweep over the armed TP/SL legs of one exchange.
pub struct TpSlTicker<E, C, N>
where
    E: OrderExecutionPort,
    C: PriceCachePort,
    N: NotifierPort,
{
    exchange: Exchange,
    queue: Arc<OrdersQueue>,
    executor: Arc<E>,
    cache: Arc<C>,
    notifier: Arc<N>,
    config: TickerConfig,
}

impl<E, C, N> TpSlTicker<E, C, N>
where
    E: OrderExecutionPort + 'static,
    C: PriceCachePort + 'static,
    N: NotifierPort + 'static,
{
    /// Create the ticker. An empty queue is loaded once from the store.
    ///
    /// # Errors
    ///
    /// Returns error if the cold load fails.
    pub async fn new(
        queue: Arc<OrdersQueue>,
        executor: Arc<E>,
        cache: Arc<C>,
        notifier: Arc<N>,
        config: TickerConfig,
    ) -> Result<Self, EngineError> {
        let exchange = queue.exchange();
        if queue.is_empty() {
            let orders = executor.active_tp_sl_orders(exchange).await?;
            let count = orders.len();
            for order in orders {
                queue.add(order);
            }
            tracing::info!(exchange = %exchange, count, "Loaded active TP/SL orders");
        }

        Ok(Self {
            exchange,
            queue,
            executor,
            cache,
            notifier,
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
        tracing::info!(exchange = %self.exchange, "TP/SL ticker started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!(exchange = %self.exchange, "TP/SL ticker stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.sweep();
                }
            }
        }
    }

    /// Spawn one evaluation per queued order that is not already claimed.
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

    /// Evaluate one leg against the cached price.
    pub async fn evaluate(&self, live: Arc<LiveOrder>) -> Evaluation {
        let Some(_claim) = live.try_claim() else {
            return Evaluation::Busy;
        };

        let mut order = live.snapshot();
        if !order.status().is_active() {
            return Evaluation::Inactive;
        }

        let trade_price = match self.cache.last_price(self.exchange, order.symbol()).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                if self.config.debug {
                    tracing::warn!(symbol = %order.symbol(), "No cached price");
                } else {
                    tracing::debug!(symbol = %order.symbol(), "No cached price");
                }
                return Evaluation::NoPrice;
            }
            Err(e) => {
                tracing::warn!(symbol = %order.symbol(), error = %e, "Price cache read failed");
                return Evaluation::NoPrice;
            }
        };

        if !TriggerRule::should_fire(order.side(), order.role(), trade_price, order.price()) {
            return Evaluation::Waiting;
        }

        tracing::info!(
            order_id = %order.id(),
            role = %order.role(),
            side = %order.side(),
            trigger_price = %order.price(),
            trade_price = %trade_price,
            "TP/SL triggered"
        );
        order.set_price(trade_price);

        match self
            .executor
            .execute_tp_sl_order(order.user_id(), &order)
            .await
        {
            Ok(ExecutionOutcome::Executed(fill_order_id)) => {
                self.notify(
                    order.user_id(),
                    Notification::TpSlExecuted {
                        role: order.role(),
                        side: order.side(),
                        price: trade_price,
                        exec_order_id: fill_order_id,
                        order_id: order.id(),
                        exchange: order.exchange(),
                        symbol: order.symbol().clone(),
                        quantity: order.quantity(),
                    },
                )
                .await;
                Evaluation::Executed(fill_order_id)
            }
            Ok(ExecutionOutcome::AlreadyHandled) => Evaluation::AlreadyHandled,
            Err(e) => {
                tracing::error!(order_id = %order.id(), error = %e, "TP/SL execution failed");
                self.notify(order.user_id(), failure(&order, &e)).await;
                Evaluation::Failed
            }
        }
    }

    async fn notify(&self, user_id: UserId, notification: Notification) {
        if let Err(e) = self.notifier.notify(user_id, &notification).await {
            tracing::warn!(user_id = %user_id, error = %e, "Notification not delivered");
        }
    }
}

fn failure(order: &Order, err: &EngineError) -> Notification {
    Notification::TpSlFailed {
        role: order.role(),
        side: order.side(),
        price: order.price(),
        symbol: order.symbol().clone(),
        reason: err.user_message().to_string(),
    }
}

impl<E, C, N> std::fmt::Debug for TpSlTicker<E, C, N>
where
    E: OrderExecutionPort,
    C: PriceCachePort,
    N: NotifierPort,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TpSlTicker")
            .field("exchange", &self.exchange)
            .field("config", &self.config)
            .field("queued", &self.queue.order_count())
            .finish_non_exhaustive()
    }
}
