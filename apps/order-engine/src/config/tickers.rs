//! Sweep intervals.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::tickers::TickerConfig;

/// Ticker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickersConfig {
    /// TP/SL sweep interval.
    #[serde(default = "default_tp_sl_interval")]
    pub tp_sl_interval_ms: u64,
    /// Limit fill sweep interval.
    #[serde(default = "default_limit_interval")]
    pub limit_interval_ms: u64,
    /// Log price-cache misses at warn.
    #[serde(default)]
    pub debug: bool,
}

impl TickersConfig {
    /// TP/SL ticker settings.
    #[must_use]
    pub const fn tp_sl(&self) -> TickerConfig {
        TickerConfig {
            interval: Duration::from_millis(self.tp_sl_interval_ms),
            debug: self.debug,
        }
    }

    /// Limit fill ticker settings.
    #[must_use]
    pub const fn limit(&self) -> TickerConfig {
        TickerConfig {
            interval: Duration::from_millis(self.limit_interval_ms),
            debug: self.debug,
        }
    }
}

impl Default for TickersConfig {
    fn default() -> Self {
        Self {
            tp_sl_interval_ms: default_tp_sl_interval(),
            limit_interval_ms: default_limit_interval(),
            debug: false,
        }
    }
}

const fn default_tp_sl_interval() -> u64 {
    1000
}

const fn default_limit_interval() -> u64 {
    5000
}
