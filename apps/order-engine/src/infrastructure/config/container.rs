//! Dependency Injection Container
//!
//! Holds the adapters chosen at startup and builds the services and tickers
//! on top of them. The execution service is built once because it owns the
//! live queues the tickers sweep.

use std::sync::Arc;

use crate::application::ports::{CredentialsPort, ExchangePort, NotifierPort, PriceCachePort};
use crate::application::services::{AccountService, OrderExecutionService, SymbolService};
use crate::application::tickers::{LimitOrderTicker, TickerConfig, TpSlTicker};
use crate::domain::order_execution::{DefaultSymbolRepository, OrderRepository};
use crate::domain::shared::Symbol;
use crate::error::EngineError;
use crate::infrastructure::market_data::{StreamConfig, TradeStreamTicker};

/// Execution service over the container's adapters.
pub type ExecutionService<R, X, C, P> = OrderExecutionService<R, X, C, P>;

/// Dependency injection container.
pub struct Container<R, D, X, C, P, N>
where
    R: OrderRepository + 'static,
    D: DefaultSymbolRepository + 'static,
    X: ExchangePort + 'static,
    C: PriceCachePort + 'static,
    P: CredentialsPort + 'static,
    N: NotifierPort + 'static,
{
    orders: Arc<R>,
    default_symbols: Arc<D>,
    exchange: Arc<X>,
    cache: Arc<C>,
    credentials: Arc<P>,
    notifier: Arc<N>,
    execution: Arc<ExecutionService<R, X, C, P>>,
}

impl<R, D, X, C, P, N> Container<R, D, X, C, P, N>
where
    R: OrderRepository + 'static,
    D: DefaultSymbolRepository + 'static,
    X: ExchangePort + 'static,
    C: PriceCachePort + 'static,
    P: CredentialsPort + 'static,
    N: NotifierPort + 'static,
{
    /// Create a new container with all dependencies.
    pub fn new(
        orders: Arc<R>,
        default_symbols: Arc<D>,
        exchange: Arc<X>,
        cache: Arc<C>,
        credentials: Arc<P>,
        notifier: Arc<N>,
    ) -> Self {
        let execution = Arc::new(OrderExecutionService::new(
            Arc::clone(&orders),
            Arc::clone(&exchange),
            Arc::clone(&cache),
            Arc::clone(&credentials),
        ));

        Self {
            orders,
            default_symbols,
            exchange,
            cache,
            credentials,
            notifier,
            execution,
        }
    }

    /// Get the order repository.
    pub fn orders(&self) -> Arc<R> {
        Arc::clone(&self.orders)
    }

    /// Get the exchange adapter.
    pub fn exchange(&self) -> Arc<X> {
        Arc::clone(&self.exchange)
    }

    /// Get the price cache.
    pub fn cache(&self) -> Arc<C> {
        Arc::clone(&self.cache)
    }

    /// Get the shared execution service.
    pub fn execution(&self) -> Arc<ExecutionService<R, X, C, P>> {
        Arc::clone(&self.execution)
    }

    /// Create an `AccountService`.
    pub fn account_service(&self) -> AccountService<X, P> {
        AccountService::new(Arc::clone(&self.exchange), Arc::clone(&self.credentials))
    }

    /// Create a `SymbolService` falling back to `configured`.
    pub fn symbol_service(&self, configured: Vec<Symbol>) -> SymbolService<R, D> {
        SymbolService::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.default_symbols),
            configured,
        )
    }

    /// Create the TP/SL ticker over the execution service's TP/SL queue.
    ///
    /// # Errors
    ///
    /// Returns error if the cold load fails.
    pub async fn tp_sl_ticker(
        &self,
        config: TickerConfig,
    ) -> Result<TpSlTicker<ExecutionService<R, X, C, P>, C, N>, EngineError> {
        TpSlTicker::new(
            Arc::clone(self.execution.tp_sl_queue()),
            Arc::clone(&self.execution),
            Arc::clone(&self.cache),
            Arc::clone(&self.notifier),
            config,
        )
        .await
    }

    /// Create the limit fill ticker over the execution service's limit queue.
    ///
    /// # Errors
    ///
    /// Returns error if the cold load fails.
    pub async fn limit_order_ticker(
        &self,
        config: TickerConfig,
    ) -> Result<LimitOrderTicker<ExecutionService<R, X, C, P>>, EngineError> {
        LimitOrderTicker::new(
            Arc::clone(self.execution.limit_queue()),
            Arc::clone(&self.execution),
            config,
        )
        .await
    }

    /// Create a trade stream for `symbol` on the container's exchange.
    pub fn trade_stream(&self, symbol: Symbol, config: StreamConfig) -> TradeStreamTicker<C> {
        TradeStreamTicker::new(
            self.exchange.exchange(),
            symbol,
            Arc::clone(&self.cache),
            config,
        )
    }
}

impl<R, D, X, C, P, N> std::fmt::Debug for Container<R, D, X, C, P, N>
where
    R: OrderRepository + 'static,
    D: DefaultSymbolRepository + 'static,
    X: ExchangePort + 'static,
    C: PriceCachePort + 'static,
    P: CredentialsPort + 'static,
    N: NotifierPort + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("exchange", &self.exchange.exchange())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NoOpNotifier;
    use crate::application::services::CredentialVault;
    use crate::domain::order_execution::{NewOrder, OrderSide, OrderStatus, OrderType, TpSlRole};
    use crate::domain::shared::{Exchange, ExchangeOrderId, UserId};
    use crate::infrastructure::crypto::AesCfbCipher;
    use crate::infrastructure::exchange::{
        BinanceConfig, BinanceEnvironment, BinanceExchangeAdapter,
    };
    use crate::infrastructure::persistence::{
        InMemoryApiKeyRepository, InMemoryDefaultSymbolRepository, InMemoryOrderRepository,
    };
    use crate::infrastructure::price_cache::InMemoryPriceCache;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    type TestContainer = Container<
        InMemoryOrderRepository,
        InMemoryDefaultSymbolRepository,
        BinanceExchangeAdapter,
        InMemoryPriceCache,
        CredentialVault<InMemoryApiKeyRepository, AesCfbCipher>,
        NoOpNotifier,
    >;

    fn container(orders: InMemoryOrderRepository) -> TestContainer {
        let exchange =
            BinanceExchangeAdapter::new(&BinanceConfig::new(BinanceEnvironment::Testnet)).unwrap();
        let vault = CredentialVault::new(
            Arc::new(InMemoryApiKeyRepository::new()),
            Arc::new(AesCfbCipher::new("0123456789abcdef").unwrap()),
        );
        Container::new(
            Arc::new(orders),
            Arc::new(InMemoryDefaultSymbolRepository::default()),
            Arc::new(exchange),
            Arc::new(InMemoryPriceCache::new()),
            Arc::new(vault),
            Arc::new(NoOpNotifier),
        )
    }

    fn leg() -> NewOrder {
        NewOrder {
            user_id: UserId::new(1),
            exec_order_id: ExchangeOrderId::new(10),
            exchange: Exchange::Binance,
            symbol: Symbol::new("BTCUSDT"),
            order_type: OrderType::Market,
            side: OrderSide::Sell,
            quantity: dec!(1),
            price: dec!(110),
            status: OrderStatus::Active,
            role: TpSlRole::TakeProfit,
            time_in_force: None,
            stop_price: None,
        }
    }

    #[tokio::test]
    async fn tickers_share_the_execution_queues() {
        let orders = InMemoryOrderRepository::new();
        orders.insert(&leg()).await;
        let container = container(orders);

        let ticker = container
            .tp_sl_ticker(TickerConfig::every(Duration::from_secs(1)))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(ticker.queue(), container.execution().tp_sl_queue()));
        assert_eq!(ticker.queue().len(), 1);

        let limit = container
            .limit_order_ticker(TickerConfig::every(Duration::from_secs(1)))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(limit.queue(), container.execution().limit_queue()));
        assert!(limit.queue().is_empty());
    }

    #[tokio::test]
    async fn symbol_service_falls_back_to_configured() {
        let container = container(InMemoryOrderRepository::new());
        let symbols = container
            .symbol_service(vec![Symbol::new("ETHUSDT")])
            .tracked_symbols(Exchange::Binance)
            .await
            .unwrap();
        assert_eq!(symbols, vec![Symbol::new("ETHUSDT")]);
    }

    #[test]
    fn trade_stream_targets_container_exchange() {
        let container = container(InMemoryOrderRepository::new());
        let stream = container.trade_stream(
            Symbol::new("BTCUSDT"),
            StreamConfig::new("wss://example.test/ws"),
        );
        assert_eq!(stream.stream_url(), "wss://example.test/ws/btcusdt@trade");
    }
}
