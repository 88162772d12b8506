//! Trade stream configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infrastructure::exchange::BinanceEnvironment;
use crate::infrastructure::market_data::StreamConfig;

/// Market data configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Stream endpoint override. Defaults to the exchange environment's.
    #[serde(default)]
    pub stream_url: Option<String>,
    /// Reconnect behaviour.
    #[serde(default)]
    pub reconnect: ReconnectSettings,
}

impl MarketDataConfig {
    /// Stream settings for `environment`.
    #[must_use]
    pub fn to_stream_config(&self, environment: BinanceEnvironment) -> StreamConfig {
        StreamConfig {
            stream_url: self
                .stream_url
                .clone()
                .unwrap_or_else(|| environment.stream_base_url().to_string()),
            reconnect_enabled: self.reconnect.enabled,
            initial_backoff: Duration::from_millis(self.reconnect.initial_delay_ms),
            max_backoff: Duration::from_millis(self.reconnect.max_delay_ms),
            backoff_multiplier: self.reconnect.multiplier,
            max_reconnect_attempts: self.reconnect.max_attempts,
        }
    }
}

/// Reconnect settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectSettings {
    /// Reconnect after a dropped stream.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// First delay ceiling.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Delay ceiling.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Growth factor.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Consecutive failures before the stream gives up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
        }
    }
}

const fn default_enabled() -> bool {
    true
}

const fn default_initial_delay() -> u64 {
    500
}

const fn default_max_delay() -> u64 {
    60_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_attempts() -> u32 {
    10
}
