//! Infrastructure Layer
//!
//! Adapters implementing the application ports:
//!
//! - `exchange/`: Binance REST adapter
//! - `market_data/`: Binance trade streams feeding the price cache
//! - `persistence/`: Order, default-symbol and API key stores (Postgres, in-memory)
//! - `price_cache/`: Last-price cache (Redis, in-memory)
//! - `crypto/`: Decryption of stored API secrets
//! - `notifier/`: User notifications (log, Telegram)
//! - `config/`: Dependency injection container

pub mod config;
pub mod crypto;
pub mod exchange;
pub mod market_data;
pub mod notifier;
pub mod persistence;
pub mod price_cache;
