//! Configuration module for the order engine.
//!
//! YAML configuration with environment variable interpolation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_engine::config::load_config;
//!
//! let config = load_config(Some("config.yaml"))?;
//! println!("TP/SL sweep every {}ms", config.tickers.tp_sl_interval_ms);
//! ```

mod exchange;
mod market_data;
mod notifier;
mod observability;
mod storage;
mod symbols;
mod tickers;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use exchange::{ExchangeConfig, RetrySettings};
pub use market_data::{MarketDataConfig, ReconnectSettings};
pub use notifier::{NotifierConfig, NotifierKind, SecurityConfig};
pub use observability::{LogFormat, LoggingConfig};
pub use storage::{CacheConfig, DatabaseConfig};
pub use symbols::SymbolsConfig;
pub use tickers::TickersConfig;

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "ORDER_ENGINE_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Order store.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Price cache.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Exchange adapter.
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Trade streams.
    #[serde(default)]
    pub market_data: MarketDataConfig,
    /// Sweep intervals.
    #[serde(default)]
    pub tickers: TickersConfig,
    /// Credential decryption.
    #[serde(default)]
    pub security: SecurityConfig,
    /// User notifications.
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Fallback stream symbols.
    #[serde(default)]
    pub symbols: SymbolsConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Path of the config file: `$ORDER_ENGINE_CONFIG` or `config.yaml`.
#[must_use]
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be interpolated, parsed, or
/// validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml)?;
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate `${VAR}` and `${VAR:-default}`. An unset or empty variable
/// without a default is an error.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    let mut result = input.to_string();
    for cap in re.captures_iter(input) {
        let (Some(full_match), Some(var_match)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_match.as_str();

        let value = match (std::env::var(var_name), cap.get(2)) {
            (Ok(v), _) if !v.is_empty() => v,
            (_, Some(default)) => default.as_str().to_string(),
            _ => return Err(ConfigError::MissingEnvVar(var_name.to_string())),
        };

        result = result.replace(full_match.as_str(), &value);
    }

    Ok(result)
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.database.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "database.url must not be empty".to_string(),
        ));
    }

    config.exchange.exchange()?;

    if config.tickers.tp_sl_interval_ms == 0 || config.tickers.limit_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "tickers intervals must be positive".to_string(),
        ));
    }

    let secret_len = config.security.api_key_secret.len();
    if ![16, 24, 32].contains(&secret_len) {
        return Err(ConfigError::ValidationError(format!(
            "security.api_key_secret must be 16, 24 or 32 bytes, got {secret_len}"
        )));
    }

    if config.notifier.kind == NotifierKind::Telegram
        && config
            .notifier
            .telegram_token
            .as_deref()
            .is_none_or(|t| t.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "notifier.telegram_token is required for the telegram notifier".to_string(),
        ));
    }

    for symbol in config.symbols.symbols() {
        symbol
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("symbols.defaults: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::exchange::BinanceEnvironment;
    use std::io::Write;
    use std::time::Duration;

    const SECRET: &str = "0123456789abcdef";

    fn minimal() -> String {
        format!("security:\n  api_key_secret: \"{SECRET}\"\n")
    }

    #[test]
    fn defaults() {
        let config = load_config_from_string(&minimal()).unwrap();
        assert_eq!(config.exchange.name, "binance");
        assert_eq!(config.exchange.environment, BinanceEnvironment::Live);
        assert_eq!(config.tickers.tp_sl_interval_ms, 1000);
        assert_eq!(config.tickers.limit_interval_ms, 5000);
        assert!(config.market_data.reconnect.enabled);
        assert_eq!(config.notifier.kind, NotifierKind::Log);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.symbols.defaults, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn env_var_with_default_when_missing() {
        let input = "name: ${ORDER_ENGINE_TEST_NONEXISTENT_VAR:-binance}";
        assert_eq!(interpolate_env_vars(input).unwrap(), "name: binance");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn env_var_with_default_uses_existing() {
        let result = interpolate_env_vars("path: ${PATH:-default}").unwrap();
        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn env_var_without_default_is_required() {
        let err = interpolate_env_vars("url: ${ORDER_ENGINE_TEST_UNLIKELY_TO_EXIST}").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "ORDER_ENGINE_TEST_UNLIKELY_TO_EXIST"));
    }

    #[test]
    fn rejects_bad_secret_length() {
        let err = load_config_from_string("security:\n  api_key_secret: short\n").unwrap_err();
        assert!(err.to_string().contains("api_key_secret"));
    }

    #[test]
    fn rejects_zero_interval() {
        let yaml = format!("{}tickers:\n  tp_sl_interval_ms: 0\n", minimal());
        let err = load_config_from_string(&yaml).unwrap_err();
        assert!(err.to_string().contains("intervals"));
    }

    #[test]
    fn rejects_unsupported_exchange() {
        let yaml = format!("{}exchange:\n  name: okx\n", minimal());
        let err = load_config_from_string(&yaml).unwrap_err();
        assert!(err.to_string().contains("no adapter"));

        let yaml = format!("{}exchange:\n  name: nasdaq\n", minimal());
        assert!(load_config_from_string(&yaml).is_err());
    }

    #[test]
    fn rejects_empty_database_url() {
        let yaml = format!("{}database:\n  url: \"\"\n", minimal());
        let err = load_config_from_string(&yaml).unwrap_err();
        assert!(err.to_string().contains("database.url"));
    }

    #[test]
    fn telegram_requires_token() {
        let yaml = format!("{}notifier:\n  kind: telegram\n", minimal());
        let err = load_config_from_string(&yaml).unwrap_err();
        assert!(err.to_string().contains("telegram_token"));

        let yaml = format!(
            "{}notifier:\n  kind: telegram\n  telegram_token: \"123:abc\"\n",
            minimal()
        );
        assert!(load_config_from_string(&yaml).is_ok());
    }

    #[test]
    fn rejects_malformed_default_symbol() {
        let yaml = format!("{}symbols:\n  defaults: [\"BTC-USDT\"]\n", minimal());
        assert!(load_config_from_string(&yaml).is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let yaml = format!(
            "{}notifier:\n  kind: telegram\n  telegram_token: \"123:abc\"\n",
            minimal()
        );
        let config = load_config_from_string(&yaml).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains(SECRET));
        assert!(!debug.contains("123:abc"));
    }

    #[test]
    fn load_full_config_from_file() {
        let yaml = format!(
            r#"
database:
  url: "postgres://engine:pw@db:5432/orders"
  max_connections: 4
cache:
  url: "redis://cache:6379/1"
exchange:
  name: binance
  environment: testnet
  base_url: "http://localhost:9000"
  timeout_secs: 3
  retry:
    max_attempts: 5
market_data:
  reconnect:
    enabled: false
tickers:
  tp_sl_interval_ms: 250
  limit_interval_ms: 2000
  debug: true
security:
  api_key_secret: "{SECRET}"
logging:
  format: json
symbols:
  defaults: [solusdt]
"#
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path().to_str()).unwrap();

        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.acquire_timeout(), Duration::from_secs(5));
        assert_eq!(config.cache.url, "redis://cache:6379/1");
        assert_eq!(config.logging.format, LogFormat::Json);

        let binance = config.exchange.to_binance_config();
        assert_eq!(binance.rest_base_url(), "http://localhost:9000");
        assert_eq!(binance.timeout, Duration::from_secs(3));
        assert_eq!(binance.retry.max_attempts, 5);

        let stream = config
            .market_data
            .to_stream_config(config.exchange.environment);
        assert_eq!(stream.stream_url, "wss://stream.testnet.binance.vision/ws");
        assert!(!stream.reconnect_enabled);

        let tp_sl = config.tickers.tp_sl();
        assert_eq!(tp_sl.interval, Duration::from_millis(250));
        assert!(tp_sl.debug);
        assert_eq!(config.tickers.limit().interval, Duration::from_secs(2));

        assert_eq!(config.symbols.symbols()[0].as_str(), "SOLUSDT");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_config(Some("/nonexistent/order-engine.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
