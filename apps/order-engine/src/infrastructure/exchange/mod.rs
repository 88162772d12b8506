//! Exchange Adapters
//!
//! Implementations of `ExchangePort` for supported venues.

pub mod binance;

pub use binance::{BinanceConfig, BinanceEnvironment, BinanceError, BinanceExchangeAdapter};
