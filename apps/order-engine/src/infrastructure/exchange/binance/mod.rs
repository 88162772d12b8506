//! Binance Spot Exchange Adapter
//!
//! Implementation of `ExchangePort` for the Binance spot REST API with:
//! - HMAC-SHA256 request signing with timestamp and receive window
//! - Retry logic with exponential backoff
//! - Live and testnet environments

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::BinanceExchangeAdapter;
pub use config::{BinanceConfig, BinanceEnvironment, RetryConfig};
pub use error::BinanceError;
