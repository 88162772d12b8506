//! Price Cache Port (Driven Port)
//!
//! Last traded price per (exchange, symbol) in a shared key-value store.
//! Keys are `pairPrice_{exchange}_{symbol}`, values textual decimals, no
//! expiry.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::shared::{Exchange, Symbol};
use crate::error::EngineError;

/// Prefix of every price key.
pub const PRICE_KEY_PREFIX: &str = "pairPrice_";

/// Cache key of the last price of `symbol` on `exchange`.
#[must_use]
pub fn price_key(exchange: Exchange, symbol: &Symbol) -> String {
    format!("{PRICE_KEY_PREFIX}{exchange}_{symbol}")
}

/// Price cache error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Connection error.
    #[error("Cache connection error: {message}")]
    Connection {
        /// Error details.
        message: String,
    },

    /// Command failed.
    #[error("Cache command failed: {message}")]
    Command {
        /// Error details.
        message: String,
    },

    /// Stored value is not a decimal.
    #[error("Cached value for {key} is not a decimal: {value}")]
    InvalidValue {
        /// Key read.
        key: String,
        /// Raw value.
        value: String,
    },
}

impl From<CacheError> for EngineError {
    fn from(err: CacheError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Port for the shared price cache.
#[async_trait]
pub trait PriceCachePort: Send + Sync {
    /// Raw read. `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Raw write without expiry.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Last traded price, parsed.
    async fn last_price(
        &self,
        exchange: Exchange,
        symbol: &Symbol,
    ) -> Result<Option<Decimal>, CacheError> {
        let key = price_key(exchange, symbol);
        match self.get(&key).await? {
            None => Ok(None),
            Some(raw) => Decimal::from_str(raw.trim())
                .map(Some)
                .map_err(|_| CacheError::InvalidValue { key, value: raw }),
        }
    }

    /// Publish a traded price exactly as received.
    async fn publish_price(
        &self,
        exchange: Exchange,
        symbol: &Symbol,
        price: &str,
    ) -> Result<(), CacheError> {
        self.set(&price_key(exchange, symbol), price).await
    }
}
