//! Periodic Tickers
//!
//! Wall-clock sweeps over the live queues. Every queued order is evaluated
//! as its own task; a sweep never waits for the previous one to finish, and
//! an order still being evaluated is skipped by later sweeps.

mod limit_order_ticker;
mod tp_sl_ticker;

use std::time::Duration;

pub use limit_order_ticker::LimitOrderTicker;
pub use tp_sl_ticker::TpSlTicker;

use crate::domain::shared::ExchangeOrderId;

/// Ticker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerConfig {
    /// Time between sweeps.
    pub interval: Duration,
    /// Log price-cache misses at warn instead of debug.
    pub debug: bool,
}

impl TickerConfig {
    /// Config with the given interval.
    #[must_use]
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval,
            debug: false,
        }
    }
}

/// Result of evaluating one queued order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Another evaluation of the order is in flight.
    Busy,
    /// The order is no longer eligible.
    Inactive,
    /// No cached price for the symbol.
    NoPrice,
    /// Trigger or fill condition not met.
    Waiting,
    /// A TP/SL leg fired; carries the exchange id of the placed order.
    Executed(ExchangeOrderId),
    /// A resting order was promoted to filled.
    Filled,
    /// The exchange closed a resting order without a fill; it was canceled
    /// locally and dropped from the queue.
    Closed,
    /// Another path handled the order first.
    AlreadyHandled,
    /// The attempt failed and was logged; the order stays queued.
    Failed,
}
