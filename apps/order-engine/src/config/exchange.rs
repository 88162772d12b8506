//! Exchange adapter configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::domain::shared::Exchange;
use crate::infrastructure::exchange::binance::RetryConfig;
use crate::infrastructure::exchange::{BinanceConfig, BinanceEnvironment};

/// Exchange configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Venue name.
    #[serde(default = "default_exchange_name")]
    pub name: String,
    /// `live` or `testnet`.
    #[serde(default)]
    pub environment: BinanceEnvironment,
    /// REST host override.
    #[serde(default)]
    pub base_url: Option<String>,
    /// `recvWindow` for signed requests.
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Retry policy for idempotent failures.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl ExchangeConfig {
    /// The configured venue.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an unknown or unsupported venue.
    pub fn exchange(&self) -> Result<Exchange, ConfigError> {
        let exchange = Exchange::from_str(&self.name)
            .map_err(|e| ConfigError::ValidationError(format!("exchange.name: {e}")))?;
        if exchange != Exchange::Binance {
            return Err(ConfigError::ValidationError(format!(
                "exchange.name: no adapter for '{exchange}'"
            )));
        }
        Ok(exchange)
    }

    /// Binance adapter settings.
    #[must_use]
    pub fn to_binance_config(&self) -> BinanceConfig {
        let mut config = BinanceConfig::new(self.environment)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(RetryConfig {
                max_attempts: self.retry.max_attempts,
                initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
                multiplier: self.retry.multiplier,
            });
        config.recv_window_ms = self.recv_window_ms;
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        config
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: default_exchange_name(),
            environment: BinanceEnvironment::default(),
            base_url: None,
            recv_window_ms: default_recv_window(),
            timeout_secs: default_timeout(),
            retry: RetrySettings::default(),
        }
    }
}

/// Retry settings for exchange REST calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First delay.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    /// Delay ceiling.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// Growth factor.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_exchange_name() -> String {
    "binance".to_string()
}

const fn default_recv_window() -> u64 {
    5000
}

const fn default_timeout() -> u64 {
    10
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff() -> u64 {
    100
}

const fn default_max_backoff() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}
