//! Order Execution Service
//!
//! The transactional core. Coordinates exchange calls, order store
//! transactions and the two live queues:
//!
//! - creation places the order on the exchange, records it with its TP/SL
//!   legs in one transaction and queues it for live attention
//! - TP/SL execution claims the firing leg and its siblings from the queue
//!   before touching the exchange, so the two legs of one base order can
//!   never both fill
//! - fill promotion hands a filled limit order's legs over to the TP/SL queue

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::application::dto::{CancelOrder, Command, CommandOutcome, CreateOrder, UpdateTpSl};
use crate::application::ports::{
    ApiCredentials, CancelOrderRequest, CredentialsPort, ExchangeError, ExchangeOrder,
    ExchangePort, ExecutionOutcome, OrderExecutionPort, PlaceOrderRequest, PriceCachePort,
};
use crate::domain::order_execution::{
    NewOrder, Order, OrderError, OrderRepository, OrderStatus, OrderTransaction, OrderType,
    Settings, TpSlRole, pricing,
};
use crate::domain::shared::{Exchange, ExchangeOrderId, OrderId, Symbol, UserId};
use crate::domain::stop_enforcement::{DetachedGroup, OrdersQueue};
use crate::error::EngineError;

/// A base order and the legs recorded with it.
#[derive(Debug)]
struct Recorded {
    base: Order,
    legs: Vec<Order>,
}

/// Order lifecycle operations for one exchange.
pub struct OrderExecutionService<R, X, C, P>
where
    R: OrderRepository,
    X: ExchangePort,
    C: PriceCachePort,
    P: CredentialsPort,
{
    repo: Arc<R>,
    exchange: Arc<X>,
    cache: Arc<C>,
    credentials: Arc<P>,
    tp_sl_queue: Arc<OrdersQueue>,
    limit_queue: Arc<OrdersQueue>,
}

impl<R, X, C, P> OrderExecutionService<R, X, C, P>
where
    R: OrderRepository,
    X: ExchangePort,
    C: PriceCachePort,
    P: CredentialsPort,
{
    /// Create a service with empty queues for the adapter's exchange.
    #[must_use]
    pub fn new(repo: Arc<R>, exchange: Arc<X>, cache: Arc<C>, credentials: Arc<P>) -> Self {
        let venue = exchange.exchange();
        Self {
            repo,
            exchange,
            cache,
            credentials,
            tp_sl_queue: Arc::new(OrdersQueue::new(venue)),
            limit_queue: Arc::new(OrdersQueue::new(venue)),
        }
    }

    /// Exchange this service trades on.
    #[must_use]
    pub fn exchange(&self) -> Exchange {
        self.exchange.exchange()
    }

    /// Queue of armed TP/SL legs.
    #[must_use]
    pub const fn tp_sl_queue(&self) -> &Arc<OrdersQueue> {
        &self.tp_sl_queue
    }

    /// Queue of resting base orders.
    #[must_use]
    pub const fn limit_queue(&self) -> &Arc<OrdersQueue> {
        &self.limit_queue
    }

    /// Dispatch a validated command.
    ///
    /// # Errors
    ///
    /// Propagates the error of the dispatched operation.
    pub async fn handle(
        &self,
        user_id: UserId,
        command: Command,
    ) -> Result<CommandOutcome, EngineError> {
        match command {
            Command::Create(create) => self
                .create_order(user_id, create)
                .await
                .map(CommandOutcome::Created),
            Command::Cancel(cancel) => self
                .cancel_order(user_id, cancel)
                .await
                .map(|()| CommandOutcome::Canceled),
            Command::UpdateTpSl(update) => self
                .update_tp_sl(user_id, update)
                .await
                .map(CommandOutcome::TpSlUpdated),
        }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Place an order on the exchange and record it with its TP/SL legs.
    ///
    /// Market orders are recorded filled at the cached trade price and their
    /// legs are armed at once. Resting orders go to the limit queue and their
    /// legs wait inactive for the fill.
    ///
    /// # Errors
    ///
    /// - not-found if the user has no keys for the exchange
    /// - the mapped exchange error if placement fails
    /// - internal if recording fails; the exchange order is then canceled
    ///   on a best-effort basis
    pub async fn create_order(
        &self,
        user_id: UserId,
        command: CreateOrder,
    ) -> Result<Order, EngineError> {
        let exchange = self.ensure_exchange(command.exchange)?;
        let credentials = self.credentials.resolve(user_id, exchange).await?;
        let request = place_request(&command)?;

        let tx = self.repo.begin().await?;
        let exec_order_id = self
            .exchange
            .create_order(&credentials, &request)
            .await
            .map_err(|e| EngineError::from(e).with_context("symbol", &command.symbol))?;

        tracing::info!(
            user_id = %user_id,
            exec_order_id = %exec_order_id,
            symbol = %command.symbol,
            side = %command.side,
            order_type = %command.order_type,
            "Order placed on exchange"
        );

        let recorded = match self
            .record_created(tx, user_id, &command, &request, exec_order_id)
            .await
        {
            Ok(recorded) => recorded,
            Err(e) => {
                tracing::error!(
                    exec_order_id = %exec_order_id,
                    error = %e,
                    "Failed to record placed order"
                );
                self.compensate(&credentials, &command.symbol, exec_order_id)
                    .await;
                return Err(e);
            }
        };

        if recorded.base.order_type().is_resting() {
            self.limit_queue.add(recorded.base.clone());
        } else {
            for leg in &recorded.legs {
                self.tp_sl_queue.add(leg.clone());
            }
        }

        Ok(recorded.base)
    }

    async fn record_created(
        &self,
        mut tx: R::Transaction,
        user_id: UserId,
        command: &CreateOrder,
        request: &PlaceOrderRequest,
        exec_order_id: ExchangeOrderId,
    ) -> Result<Recorded, EngineError> {
        let (price, status) = match command.order_type {
            OrderType::Market => (
                self.market_price(command.exchange, &command.symbol, command.price)
                    .await?,
                OrderStatus::Filled,
            ),
            OrderType::Limit | OrderType::StopLossLimit => (
                request
                    .price
                    .ok_or_else(|| EngineError::validation("price is required"))?,
                OrderStatus::Active,
            ),
        };

        let base = NewOrder {
            user_id,
            exec_order_id,
            symbol: command.symbol.clone(),
            side: command.side,
            order_type: command.order_type,
            quantity: command.quantity,
            price,
            time_in_force: request.time_in_force,
            stop_price: request.stop_price,
            exchange: command.exchange,
            status,
            role: TpSlRole::Base,
        };

        let base_id = if command.settings.is_empty() {
            tx.create_order(&base).await?
        } else {
            tx.create_order_with_settings(&base, &command.settings)
                .await?
        };

        let leg_status = if command.order_type.is_resting() {
            OrderStatus::Inactive
        } else {
            OrderStatus::Active
        };

        let mut legs = Vec::new();
        for (role, spec) in command.settings.configured_legs() {
            let Some(trigger) = pricing::leg_trigger_price(price, command.side, role, spec) else {
                continue;
            };
            let leg = base.leg(role, trigger, spec.execution_type(), leg_status);
            let id = tx.create_order(&leg).await?;
            legs.push(leg.into_order(id));
        }

        tx.commit().await?;

        Ok(Recorded {
            base: base.into_order(base_id),
            legs,
        })
    }

    /// Fill price of a market order: the cached trade price, else the
    /// price the user sent along.
    async fn market_price(
        &self,
        exchange: Exchange,
        symbol: &Symbol,
        fallback: Option<Decimal>,
    ) -> Result<Decimal, EngineError> {
        match self.cache.last_price(exchange, symbol).await {
            Ok(Some(price)) => return Ok(price),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Price cache read failed");
            }
        }
        fallback.ok_or_else(|| {
            EngineError::internal(format!("no market price available for {symbol}"))
        })
    }

    async fn compensate(
        &self,
        credentials: &ApiCredentials,
        symbol: &Symbol,
        exec_order_id: ExchangeOrderId,
    ) {
        let request = CancelOrderRequest::new(symbol.clone(), exec_order_id);
        match self.exchange.cancel_order(credentials, &request).await {
            Ok(()) => tracing::warn!(
                exec_order_id = %exec_order_id,
                "Canceled unrecorded exchange order"
            ),
            Err(e) => tracing::error!(
                exec_order_id = %exec_order_id,
                symbol = %symbol,
                error = %e,
                "Compensating cancel failed, exchange order has no local record"
            ),
        }
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancel an order.
    ///
    /// A base order is canceled on the exchange first and then, with all of
    /// its open legs, in the store. A leg has never reached the exchange and
    /// is canceled locally only.
    ///
    /// # Errors
    ///
    /// - not-found if the order does not exist or belongs to another user
    /// - bad-request if it is already filled or canceled
    /// - the mapped exchange error if the exchange refuses; the store is
    ///   left untouched
    pub async fn cancel_order(
        &self,
        user_id: UserId,
        command: CancelOrder,
    ) -> Result<(), EngineError> {
        let exchange = self.ensure_exchange(command.exchange)?;
        let order = self
            .repo
            .get_order(command.id, &command.symbol, exchange)
            .await?
            .filter(|order| order.user_id() == user_id)
            .ok_or_else(|| order_not_found(command.id))?;

        if order.status().is_terminal() {
            return Err(OrderError::AlreadyClosed {
                order_id: order.id().to_string(),
                status: order.status(),
            }
            .into());
        }

        if order.role().is_leg() {
            let mut tx = self.repo.begin().await?;
            tx.cancel_order(order.id()).await?;
            tx.commit().await?;
            self.tp_sl_queue.remove(order.symbol(), order.id());
            tracing::info!(order_id = %order.id(), role = %order.role(), "TP/SL order canceled");
            return Ok(());
        }

        let credentials = self.credentials.resolve(user_id, exchange).await?;
        let request = CancelOrderRequest::new(order.symbol().clone(), order.exec_order_id());
        self.exchange
            .cancel_order(&credentials, &request)
            .await
            .map_err(|e| EngineError::from(e).with_context("order_id", order.id()))?;

        let legs = match self.cancel_locally(&order).await {
            Ok(legs) => legs,
            Err(e) => {
                tracing::error!(
                    order_id = %order.id(),
                    exec_order_id = %order.exec_order_id(),
                    error = %e,
                    "Order canceled on exchange but still open locally"
                );
                return Err(e);
            }
        };

        self.limit_queue.remove(order.symbol(), order.id());
        for leg in &legs {
            self.tp_sl_queue.remove(leg.symbol(), leg.id());
        }

        tracing::info!(
            order_id = %order.id(),
            exec_order_id = %order.exec_order_id(),
            legs = legs.len(),
            "Order canceled"
        );
        Ok(())
    }

    async fn cancel_locally(&self, base: &Order) -> Result<Vec<Order>, EngineError> {
        let mut tx = self.repo.begin().await?;
        let legs = tx.get_tp_sl_orders_by_base_order(base).await?;
        tx.cancel_orders_by_exchange_id(base).await?;
        tx.commit().await?;
        Ok(legs)
    }

    // ========================================================================
    // TP/SL settings
    // ========================================================================

    /// Recompute TP and/or SL trigger prices from new settings.
    ///
    /// The new prices are pushed into the live queue so the next sweep uses
    /// them. Returns the new trigger price per updated leg.
    ///
    /// # Errors
    ///
    /// - not-found if the base order or an updated leg does not exist
    /// - bad-request if the order is a leg or is canceled
    pub async fn update_tp_sl(
        &self,
        user_id: UserId,
        command: UpdateTpSl,
    ) -> Result<Vec<(TpSlRole, Decimal)>, EngineError> {
        let exchange = self.ensure_exchange(command.exchange)?;
        let mut tx = self.repo.begin().await?;

        let base = tx
            .get_order(command.id, &command.symbol, exchange)
            .await?
            .filter(|order| order.user_id() == user_id)
            .ok_or_else(|| order_not_found(command.id))?;
        if base.role().is_leg() {
            return Err(EngineError::bad_request(
                "TP/SL can only be changed on the order they belong to",
            ));
        }
        if base.status() == OrderStatus::Canceled {
            return Err(OrderError::AlreadyClosed {
                order_id: base.id().to_string(),
                status: base.status(),
            }
            .into());
        }

        let mut settings = tx.get_settings(base.id()).await?.unwrap_or_default();
        settings.order_id = base.id();
        settings.take_profit.apply(&command.take_profit);
        settings.stop_loss.apply(&command.stop_loss);

        let mut updated = Vec::new();
        for (role, change) in [
            (TpSlRole::TakeProfit, &command.take_profit),
            (TpSlRole::StopLoss, &command.stop_loss),
        ] {
            if change.is_empty() {
                continue;
            }
            let leg = tx
                .get_tp_sl_order_by_base_order(&base, role)
                .await?
                .ok_or_else(|| {
                    EngineError::not_found(format!(
                        "no open {} order for order {}",
                        leg_label(role),
                        base.id()
                    ))
                })?;
            let Some(price) = settings
                .leg(role)
                .and_then(|spec| pricing::leg_trigger_price(base.price(), base.side(), role, spec))
            else {
                continue;
            };
            tx.update_tp_sl(leg.id(), price, &settings).await?;
            updated.push((leg, price));
        }

        tx.commit().await?;

        for (leg, price) in &updated {
            self.tp_sl_queue.update_price(leg.symbol(), leg.id(), *price);
            tracing::info!(
                order_id = %leg.id(),
                role = %leg.role(),
                price = %price,
                "TP/SL trigger price updated"
            );
        }

        Ok(updated
            .into_iter()
            .map(|(leg, price)| (leg.role(), price))
            .collect())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    async fn place_leg(
        &self,
        user_id: UserId,
        order: &Order,
    ) -> Result<ExchangeOrderId, EngineError> {
        let credentials = self.credentials.resolve(user_id, order.exchange()).await?;
        let request = PlaceOrderRequest::for_leg(order);
        self.exchange
            .create_order(&credentials, &request)
            .await
            .map_err(|e| EngineError::from(e).with_context("order_id", order.id()))
    }

    async fn record_execution(
        &self,
        order: &Order,
        fill_order_id: ExchangeOrderId,
    ) -> Result<(), EngineError> {
        let mut tx = self.repo.begin().await?;
        if let Some(opposing) = tx.get_opposing_tp_sl_order(order).await? {
            tx.cancel_order(opposing.id()).await?;
            self.tp_sl_queue.remove(opposing.symbol(), opposing.id());
            tracing::info!(
                order_id = %opposing.id(),
                role = %opposing.role(),
                "Opposing TP/SL order canceled"
            );
        }
        tx.execute_order(order.id(), Some(fill_order_id)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn promote_fill(&self, order: &Order) -> Result<Vec<Order>, EngineError> {
        let mut tx = self.repo.begin().await?;
        tx.execute_order(order.id(), None).await?;

        let mut activated = Vec::new();
        for mut leg in tx.get_tp_sl_orders_by_base_order(order).await? {
            if leg.status() != OrderStatus::Inactive {
                continue;
            }
            tx.activate_order(leg.id()).await?;
            leg.activate()?;
            activated.push(leg);
        }

        tx.commit().await?;
        Ok(activated)
    }

    fn ensure_exchange(&self, requested: Exchange) -> Result<Exchange, EngineError> {
        if requested == self.exchange.exchange() {
            Ok(requested)
        } else {
            Err(ExchangeError::Unsupported {
                exchange: requested,
            }
            .into())
        }
    }
}

#[async_trait::async_trait]
impl<R, X, C, P> OrderExecutionPort for OrderExecutionService<R, X, C, P>
where
    R: OrderRepository + 'static,
    X: ExchangePort + 'static,
    C: PriceCachePort + 'static,
    P: CredentialsPort + 'static,
{
    async fn active_tp_sl_orders(&self, exchange: Exchange) -> Result<Vec<Order>, EngineError> {
        Ok(self.repo.get_active_tp_sl_orders(exchange).await?)
    }

    async fn limit_orders(&self, exchange: Exchange) -> Result<Vec<Order>, EngineError> {
        Ok(self.repo.get_limit_orders(exchange).await?)
    }

    async fn execute_tp_sl_order(
        &self,
        user_id: UserId,
        order: &Order,
    ) -> Result<ExecutionOutcome, EngineError> {
        let Some(group) = self
            .tp_sl_queue
            .take_with_siblings(order.symbol(), order.id())
        else {
            tracing::debug!(order_id = %order.id(), "TP/SL order already handled");
            return Ok(ExecutionOutcome::AlreadyHandled);
        };

        let fill_order_id = match self.place_leg(user_id, order).await {
            Ok(id) => id,
            Err(e) => {
                self.tp_sl_queue.restore(group);
                return Err(e);
            }
        };

        if let Err(e) = self.record_execution(order, fill_order_id).await {
            tracing::error!(
                order_id = %order.id(),
                fill_order_id = %fill_order_id,
                error = %e,
                "TP/SL order executed on exchange but not recorded"
            );
            return Err(e.with_context("fill_order_id", fill_order_id));
        }

        tracing::info!(
            order_id = %order.id(),
            role = %order.role(),
            fill_order_id = %fill_order_id,
            price = %order.price(),
            siblings = group.siblings.len(),
            "TP/SL order executed"
        );
        Ok(ExecutionOutcome::Executed(fill_order_id))
    }

    async fn exchange_order(&self, order: &Order) -> Result<ExchangeOrder, EngineError> {
        let credentials = self
            .credentials
            .resolve(order.user_id(), order.exchange())
            .await?;
        self.exchange
            .get_order(&credentials, order.symbol(), order.exec_order_id())
            .await
            .map_err(|e| EngineError::from(e).with_context("order_id", order.id()))
    }

    async fn set_filled_limit_order(&self, order: &Order) -> Result<bool, EngineError> {
        let Some(live) = self.limit_queue.take(order.symbol(), order.id()) else {
            return Ok(false);
        };

        match self.promote_fill(order).await {
            Ok(legs) => {
                tracing::info!(
                    order_id = %order.id(),
                    exec_order_id = %order.exec_order_id(),
                    legs = legs.len(),
                    "Limit order filled"
                );
                for leg in legs {
                    self.tp_sl_queue.add(leg);
                }
                Ok(true)
            }
            Err(e) => {
                self.limit_queue.restore(DetachedGroup {
                    order: live,
                    siblings: Vec::new(),
                });
                Err(e)
            }
        }
    }

    async fn set_closed_limit_order(&self, order: &Order) -> Result<bool, EngineError> {
        let Some(live) = self.limit_queue.take(order.symbol(), order.id()) else {
            return Ok(false);
        };

        match self.cancel_locally(order).await {
            Ok(legs) => {
                tracing::warn!(
                    order_id = %order.id(),
                    exec_order_id = %order.exec_order_id(),
                    legs = legs.len(),
                    "Limit order closed on exchange without a fill"
                );
                Ok(true)
            }
            Err(e) => {
                self.limit_queue.restore(DetachedGroup {
                    order: live,
                    siblings: Vec::new(),
                });
                Err(e)
            }
        }
    }
}

fn place_request(command: &CreateOrder) -> Result<PlaceOrderRequest, EngineError> {
    let tif = command.time_in_force.unwrap_or_default();
    let request = match command.order_type {
        OrderType::Market => {
            PlaceOrderRequest::market(command.symbol.clone(), command.side, command.quantity)
        }
        OrderType::Limit => {
            let price = command
                .price
                .ok_or_else(|| EngineError::validation("price is required for LIMIT orders"))?;
            PlaceOrderRequest::limit(command.symbol.clone(), command.side, command.quantity, price)
                .with_time_in_force(tif)
        }
        OrderType::StopLossLimit => {
            let (Some(stop_price), Some(stop_percent)) = (command.stop_price, command.stop_percent)
            else {
                return Err(EngineError::validation(
                    "stopPrice and stopPercent are required for STOP_LOSS_LIMIT orders",
                ));
            };
            let price = pricing::stop_limit_price(stop_price, stop_percent, command.side)?;
            PlaceOrderRequest::stop_loss_limit(
                command.symbol.clone(),
                command.side,
                command.quantity,
                price,
                stop_price,
            )
            .with_time_in_force(tif)
        }
    };
    Ok(request)
}

fn order_not_found(id: OrderId) -> EngineError {
    OrderError::NotFound {
        order_id: id.to_string(),
    }
    .into()
}

const fn leg_label(role: TpSlRole) -> &'static str {
    match role {
        TpSlRole::TakeProfit => "take-profit",
        TpSlRole::StopLoss => "stop-loss",
        TpSlRole::Base => "base",
    }
}

impl<R, X, C, P> std::fmt::Debug for OrderExecutionService<R, X, C, P>
where
    R: OrderRepository,
    X: ExchangePort,
    C: PriceCachePort,
    P: CredentialsPort,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderExecutionService")
            .field("exchange", &self.exchange.exchange())
            .field("tp_sl_orders", &self.tp_sl_queue.order_count())
            .field("limit_orders", &self.limit_queue.order_count())
            .finish_non_exhaustive()
    }
}
