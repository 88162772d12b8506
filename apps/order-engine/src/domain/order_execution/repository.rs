//! Order Repository Traits
//!
//! Persistence abstractions for orders and their settings. Multi-statement
//! writes go through an [`OrderTransaction`] obtained from
//! [`OrderRepository::begin`]; dropping a transaction without calling
//! [`OrderTransaction::commit`] rolls it back, including while unwinding
//! from a panic.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::aggregate::{NewOrder, Order, Settings};
use super::value_objects::TpSlRole;
use crate::domain::shared::{Exchange, ExchangeOrderId, OrderId, Symbol};

/// Errors raised by persistence adapters.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Could not reach the store.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed.
    #[error("Query error: {0}")]
    Query(String),

    /// A stored value could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A write touched no row it was expected to change.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type.
        entity: &'static str,
        /// Identifier used for the lookup.
        id: String,
    },
}

/// Order store.
///
/// Reads that do not take part in a multi-statement sequence are issued
/// directly on the repository.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Transaction handle type.
    type Transaction: OrderTransaction;

    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    async fn begin(&self) -> Result<Self::Transaction, RepositoryError>;

    /// Fetch an order by local id, scoped to a symbol and exchange.
    async fn get_order(
        &self,
        id: OrderId,
        symbol: &Symbol,
        exchange: Exchange,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Distinct symbols that have at least one active order.
    async fn get_active_symbols(&self, exchange: Exchange) -> Result<Vec<Symbol>, RepositoryError>;

    /// Base orders resting on the exchange (limit and stop-loss-limit), active
    /// or partially filled.
    async fn get_limit_orders(&self, exchange: Exchange) -> Result<Vec<Order>, RepositoryError>;

    /// Active TP/SL legs.
    async fn get_active_tp_sl_orders(
        &self,
        exchange: Exchange,
    ) -> Result<Vec<Order>, RepositoryError>;
}

/// Unit of work over the order store.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Insert an order and return its id.
    async fn create_order(&mut self, order: &NewOrder) -> Result<OrderId, RepositoryError>;

    /// Insert a base order together with its settings row.
    ///
    /// `settings.order_id` is ignored; the new order's id is used.
    async fn create_order_with_settings(
        &mut self,
        order: &NewOrder,
        settings: &Settings,
    ) -> Result<OrderId, RepositoryError>;

    /// Mark an order canceled.
    async fn cancel_order(&mut self, id: OrderId) -> Result<(), RepositoryError>;

    /// Cancel `base` and every non-terminal leg hanging off it. A group is
    /// keyed by exchange order id, symbol, exchange and owner, since exchange
    /// ids are only unique per symbol. Returns the number of rows changed.
    async fn cancel_orders_by_exchange_id(&mut self, base: &Order) -> Result<u64, RepositoryError>;

    /// Mark an order filled, recording the exchange id a fired leg produced.
    async fn execute_order(
        &mut self,
        id: OrderId,
        fill_order_id: Option<ExchangeOrderId>,
    ) -> Result<(), RepositoryError>;

    /// Flip an inactive leg to active.
    async fn activate_order(&mut self, id: OrderId) -> Result<(), RepositoryError>;

    /// Store a leg's new trigger price and its base order's settings.
    async fn update_tp_sl(
        &mut self,
        leg_id: OrderId,
        price: Decimal,
        settings: &Settings,
    ) -> Result<(), RepositoryError>;

    /// Fetch an order by local id inside the transaction.
    async fn get_order(
        &mut self,
        id: OrderId,
        symbol: &Symbol,
        exchange: Exchange,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Settings of a base order.
    async fn get_settings(&mut self, order_id: OrderId)
    -> Result<Option<Settings>, RepositoryError>;

    /// The non-terminal leg with `role` hanging off a base order.
    async fn get_tp_sl_order_by_base_order(
        &mut self,
        base: &Order,
        role: TpSlRole,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Every leg hanging off a base order, whatever its status.
    async fn get_tp_sl_orders_by_base_order(
        &mut self,
        base: &Order,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// The non-terminal sibling leg of `order`, if any.
    async fn get_opposing_tp_sl_order(
        &mut self,
        order: &Order,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Make every write of this transaction durable.
    async fn commit(self) -> Result<(), RepositoryError>;
}

/// Store of fallback symbols streamed when no order is active.
#[async_trait]
pub trait DefaultSymbolRepository: Send + Sync {
    /// All default symbols.
    async fn get_default_symbols(&self) -> Result<Vec<Symbol>, RepositoryError>;

    /// Add a default symbol. Adding an existing symbol is a no-op.
    async fn add_symbol(&self, symbol: &Symbol) -> Result<(), RepositoryError>;
}
