//! Binance adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Binance environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinanceEnvironment {
    /// Production spot API.
    #[default]
    Live,
    /// Spot testnet.
    Testnet,
}

impl BinanceEnvironment {
    /// REST base URL.
    #[must_use]
    pub const fn rest_base_url(&self) -> &'static str {
        match self {
            Self::Live => "https://api.binance.com",
            Self::Testnet => "https://testnet.binance.vision",
        }
    }

    /// Raw websocket stream base URL.
    #[must_use]
    pub const fn stream_base_url(&self) -> &'static str {
        match self {
            Self::Live => "wss://stream.binance.com:9443/ws",
            Self::Testnet => "wss://stream.testnet.binance.vision/ws",
        }
    }

    /// Check if this is the production API.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl std::fmt::Display for BinanceEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "LIVE"),
            Self::Testnet => write!(f, "TESTNET"),
        }
    }
}

/// Configuration for the Binance adapter.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// Environment.
    pub environment: BinanceEnvironment,
    /// REST base URL override.
    pub base_url: Option<String>,
    /// `recvWindow` sent with signed requests, in milliseconds.
    pub recv_window_ms: u64,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Retry policy configuration.
    pub retry: RetryConfig,
}

impl BinanceConfig {
    /// Create a configuration with default timeouts.
    #[must_use]
    pub fn new(environment: BinanceEnvironment) -> Self {
        Self {
            environment,
            base_url: None,
            recv_window_ms: 5000,
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }

    /// Point the adapter at another REST host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Effective REST base URL, without trailing slash.
    #[must_use]
    pub fn rest_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.rest_base_url())
            .trim_end_matches('/')
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts.
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn testnet_urls() {
        let env = BinanceEnvironment::Testnet;
        assert!(env.rest_base_url().contains("testnet"));
        assert!(env.stream_base_url().starts_with("wss://"));
        assert!(!env.is_live());
    }

    #[test]
    fn override_wins_and_is_trimmed() {
        let config =
            BinanceConfig::new(BinanceEnvironment::Live).with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.rest_base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn default_base_url_follows_environment() {
        let config = BinanceConfig::new(BinanceEnvironment::Live);
        assert_eq!(config.rest_base_url(), "https://api.binance.com");
    }

    #[test]
    fn environment_display() {
        assert_eq!(BinanceEnvironment::Live.to_string(), "LIVE");
        assert_eq!(BinanceEnvironment::Testnet.to_string(), "TESTNET");
    }

    #[test]
    fn retry_config_default() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.initial_backoff, Duration::from_millis(100));
        assert_eq!(retry.multiplier, 2.0);
    }
}
