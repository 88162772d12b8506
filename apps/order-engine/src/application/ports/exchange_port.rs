//! Exchange Port (Driven Port)
//!
//! Capability interface of one exchange venue. Every private call is made
//! with the decrypted credentials of the user it acts for.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::credentials_port::ApiCredentials;
use crate::domain::account::{Balance, Depth};
use crate::domain::order_execution::{Order, OrderSide, OrderStatus, OrderType, TimeInForce};
use crate::domain::shared::{Exchange, ExchangeOrderId, Symbol};
use crate::error::EngineError;

/// Request to place an order on the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    /// Client order ID sent to the exchange for idempotency.
    pub client_order_id: String,
    /// Trading pair.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity.
    pub quantity: Decimal,
    /// Limit price (for limit and stop-loss-limit orders).
    pub price: Option<Decimal>,
    /// Stop price (for stop-loss-limit orders).
    pub stop_price: Option<Decimal>,
    /// Time in force (for limit and stop-loss-limit orders).
    pub time_in_force: Option<TimeInForce>,
}

impl PlaceOrderRequest {
    /// Create a market order request.
    #[must_use]
    pub fn market(symbol: Symbol, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            client_order_id: uuid::Uuid::new_v4().simple().to_string(),
            symbol,
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
        }
    }

    /// Create a limit order request, good-til-canceled.
    #[must_use]
    pub fn limit(symbol: Symbol, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self {
            order_type: OrderType::Limit,
            price: Some(price),
            time_in_force: Some(TimeInForce::Gtc),
            ..Self::market(symbol, side, quantity)
        }
    }

    /// Create a stop-loss-limit order request.
    #[must_use]
    pub fn stop_loss_limit(
        symbol: Symbol,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            order_type: OrderType::StopLossLimit,
            stop_price: Some(stop_price),
            ..Self::limit(symbol, side, quantity, price)
        }
    }

    /// The exchange order a fired TP/SL leg sends: its own type, side and
    /// quantity, priced at the leg's current price when a price is needed.
    #[must_use]
    pub fn for_leg(order: &Order) -> Self {
        match order.order_type() {
            OrderType::Market => {
                Self::market(order.symbol().clone(), order.side(), order.quantity())
            }
            OrderType::Limit | OrderType::StopLossLimit => Self::limit(
                order.symbol().clone(),
                order.side(),
                order.quantity(),
                order.price(),
            ),
        }
    }

    /// Set time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = Some(tif);
        self
    }
}

/// Request to cancel an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    /// Trading pair.
    pub symbol: Symbol,
    /// Exchange order ID.
    pub exec_order_id: ExchangeOrderId,
}

impl CancelOrderRequest {
    /// Create a cancel request.
    #[must_use]
    pub const fn new(symbol: Symbol, exec_order_id: ExchangeOrderId) -> Self {
        Self {
            symbol,
            exec_order_id,
        }
    }
}

/// Replace an open order: cancel `exec_order_id`, then place `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    /// Order to cancel.
    pub exec_order_id: ExchangeOrderId,
    /// Order to place instead.
    pub replacement: PlaceOrderRequest,
}

/// An order as the exchange reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOrder {
    /// Exchange order ID.
    pub exec_order_id: ExchangeOrderId,
    /// Trading pair.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type, if one the engine knows.
    pub order_type: Option<OrderType>,
    /// Status mapped onto local statuses; `None` for statuses with no
    /// local counterpart (expired, rejected, ...).
    pub status: Option<OrderStatus>,
    /// Ordered quantity.
    pub quantity: Decimal,
    /// Executed quantity.
    pub executed_quantity: Decimal,
    /// Order price.
    pub price: Decimal,
}

impl ExchangeOrder {
    /// Returns true if the exchange reports the order completely filled.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.status == Some(OrderStatus::Filled)
    }

    /// Returns true if the exchange closed the order without filling it.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == Some(OrderStatus::Canceled)
    }
}

/// Exchange port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExchangeError {
    /// Connection error.
    #[error("Exchange connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// API key rejected.
    #[error("Exchange authentication failed: {message}")]
    AuthenticationFailed {
        /// Error details.
        message: String,
    },

    /// Order rejected by the exchange.
    #[error("Order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason.
        reason: String,
    },

    /// Order not found.
    #[error("Order not found on exchange: {order_id}")]
    OrderNotFound {
        /// The missing order ID.
        order_id: String,
    },

    /// Insufficient balance.
    #[error("Insufficient balance")]
    InsufficientFunds,

    /// Rate limited.
    #[error("Rate limited by exchange")]
    RateLimited,

    /// Venue has no adapter.
    #[error("Exchange not supported: {exchange}")]
    Unsupported {
        /// Requested venue.
        exchange: Exchange,
    },

    /// Unknown error.
    #[error("Exchange error: {message}")]
    Unknown {
        /// Error details.
        message: String,
    },
}

impl From<ExchangeError> for EngineError {
    fn from(err: ExchangeError) -> Self {
        match &err {
            ExchangeError::OrderRejected { .. }
            | ExchangeError::InsufficientFunds
            | ExchangeError::AuthenticationFailed { .. }
            | ExchangeError::Unsupported { .. } => Self::bad_request(err.to_string()),
            ExchangeError::OrderNotFound { .. } => Self::not_found(err.to_string()),
            ExchangeError::ConnectionError { .. }
            | ExchangeError::RateLimited
            | ExchangeError::Unknown { .. } => Self::internal(err.to_string()),
        }
    }
}

/// Port for exchange interactions.
#[async_trait]
pub trait ExchangePort: Send + Sync {
    /// Venue served by this adapter.
    fn exchange(&self) -> Exchange;

    /// Place an order and return the exchange-assigned id.
    async fn create_order(
        &self,
        credentials: &ApiCredentials,
        request: &PlaceOrderRequest,
    ) -> Result<ExchangeOrderId, ExchangeError>;

    /// Cancel an open order.
    async fn cancel_order(
        &self,
        credentials: &ApiCredentials,
        request: &CancelOrderRequest,
    ) -> Result<(), ExchangeError>;

    /// Cancel an order and place its replacement.
    async fn update_order(
        &self,
        credentials: &ApiCredentials,
        request: &UpdateOrderRequest,
    ) -> Result<ExchangeOrderId, ExchangeError>;

    /// Account balance.
    async fn balance(&self, credentials: &ApiCredentials) -> Result<Balance, ExchangeError>;

    /// Open orders, optionally for one symbol.
    async fn get_open_orders(
        &self,
        credentials: &ApiCredentials,
        symbol: Option<&Symbol>,
    ) -> Result<Vec<ExchangeOrder>, ExchangeError>;

    /// One order's current state.
    async fn get_order(
        &self,
        credentials: &ApiCredentials,
        symbol: &Symbol,
        exec_order_id: ExchangeOrderId,
    ) -> Result<ExchangeOrder, ExchangeError>;

    /// Tradable symbols.
    async fn get_symbols(&self, credentials: &ApiCredentials)
    -> Result<Vec<Symbol>, ExchangeError>;

    /// Order book snapshot.
    async fn depth(&self, symbol: &Symbol, limit: u16) -> Result<Depth, ExchangeError>;
}
