// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Order Engine - Rust Core Library
//!
//! Places spot orders on crypto exchanges for users and closes them
//! automatically when the market reaches their take-profit or stop-loss.
//!
//! # Architecture (Hexagonal)
//!
//! - **Domain**: order records, TP/SL legs, the live queues and the trigger rule
//! - **Application**: ports, the execution service, account and symbol
//!   queries, and the periodic tickers
//! - **Infrastructure**: Binance REST and trade streams, Postgres, Redis,
//!   secret decryption, notifiers and the dependency container
//!
//! # Moving parts
//!
//! - one trade stream per (exchange, symbol) writes the last price to the cache
//! - the TP/SL ticker compares each armed leg with that price and fires it
//! - the limit ticker polls resting orders and arms their legs once filled

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Services, tickers and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// YAML configuration.
pub mod config;

/// Engine-wide error type.
pub mod error;

// Domain re-exports
pub use domain::order_execution::{
    NewOrder, Order, OrderSide, OrderStatus, OrderType, Settings, TimeInForce, TpSlRole,
};
pub use domain::shared::{Exchange, ExchangeOrderId, OrderId, Symbol, UserId};
pub use domain::stop_enforcement::{LiveOrder, OrdersQueue, TriggerRule};

// Application re-exports
pub use application::dto::{Command, CommandOutcome, EngineCommand};
pub use application::services::{AccountService, OrderExecutionService, SymbolService};
pub use application::tickers::{LimitOrderTicker, TickerConfig, TpSlTicker};

// Infrastructure re-exports
pub use infrastructure::config::Container;
pub use infrastructure::exchange::{BinanceConfig, BinanceEnvironment, BinanceExchangeAdapter};
pub use infrastructure::market_data::{StreamConfig, TradeStreamTicker};

pub use error::{EngineError, ErrorCode};
