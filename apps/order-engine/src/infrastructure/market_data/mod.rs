//! Market Data Streams
//!
//! One long-lived trade stream per (exchange, symbol). Every trade price is
//! written to the shared price cache, where the TP/SL ticker reads it.

mod reconnect;
mod trade_stream;

use std::time::Duration;

pub use reconnect::ReconnectPolicy;
pub use trade_stream::{TradeStreamTicker, parse_trade_price};

/// Trade stream settings.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Base URL of the raw stream endpoint, e.g. `wss://stream.binance.com:9443/ws`.
    pub stream_url: String,
    /// Reconnect after a transport failure. When false a dropped stream ends the ticker.
    pub reconnect_enabled: bool,
    /// First reconnect delay ceiling.
    pub initial_backoff: Duration,
    /// Largest reconnect delay ceiling.
    pub max_backoff: Duration,
    /// Growth factor per attempt.
    pub backoff_multiplier: f64,
    /// Consecutive failed attempts before giving up.
    pub max_reconnect_attempts: u32,
}

impl StreamConfig {
    /// Settings for `stream_url` with default reconnect behaviour.
    #[must_use]
    pub fn new(stream_url: impl Into<String>) -> Self {
        Self {
            stream_url: stream_url.into(),
            ..Self::default()
        }
    }

    /// Disable reconnection.
    #[must_use]
    pub const fn without_reconnect(mut self) -> Self {
        self.reconnect_enabled = false;
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            stream_url: "wss://stream.binance.com:9443/ws".to_string(),
            reconnect_enabled: true,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            max_reconnect_attempts: 10,
        }
    }
}

/// Trade stream errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketDataError {
    /// Connection could not be established.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        /// Error details.
        message: String,
    },

    /// Connection dropped while reading.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Close reason.
        reason: String,
    },

    /// A frame could not be decoded.
    #[error("failed to parse message: {message}")]
    ParseError {
        /// Error details.
        message: String,
    },
}
