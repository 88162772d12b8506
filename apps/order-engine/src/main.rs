//! Order Engine Binary
//!
//! Starts the trade streams and the TP/SL and limit fill tickers.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-engine
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_ENGINE_CONFIG`: config file path (default: config.yaml)
//! - `RUST_LOG`: log filter (default: order_engine=info)
//! - anything the config file interpolates, e.g. `DATABASE_URL`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use order_engine::application::services::CredentialVault;
use order_engine::config::{Config, LogFormat, NotifierKind, config_path, load_config};
use order_engine::infrastructure::config::Container;
use order_engine::infrastructure::crypto::AesCfbCipher;
use order_engine::infrastructure::exchange::BinanceExchangeAdapter;
use order_engine::infrastructure::notifier::{ConfiguredNotifier, TelegramNotifier, TracingNotifier};
use order_engine::infrastructure::persistence::{
    PgApiKeyRepository, PgDefaultSymbolRepository, PgOrderRepository, PgStore,
};
use order_engine::infrastructure::price_cache::RedisPriceCache;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Production wiring.
type EngineContainer = Container<
    PgOrderRepository,
    PgDefaultSymbolRepository,
    BinanceExchangeAdapter,
    RedisPriceCache,
    CredentialVault<PgApiKeyRepository, AesCfbCipher>,
    ConfiguredNotifier,
>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS operations
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    load_dotenv();

    let path = config_path();
    let config = load_config(Some(&path)).with_context(|| format!("loading {path}"))?;
    init_tracing(config.logging.format);

    tracing::info!(
        config = %path,
        exchange = %config.exchange.name,
        environment = %config.exchange.environment,
        "Starting order engine"
    );

    let store = PgStore::connect(
        &config.database.url,
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await
    .context("connecting to the order store")?;
    store.migrate().await.context("running migrations")?;

    let container = create_container(&config, &store).await?;
    let shutdown = CancellationToken::new();
    let mut tasks = JoinSet::new();

    let tp_sl = Arc::new(
        container
            .tp_sl_ticker(config.tickers.tp_sl())
            .await
            .context("loading active TP/SL orders")?,
    );
    tasks.spawn(Arc::clone(&tp_sl).run(shutdown.clone()));

    let limit = Arc::new(
        container
            .limit_order_ticker(config.tickers.limit())
            .await
            .context("loading resting limit orders")?,
    );
    tasks.spawn(Arc::clone(&limit).run(shutdown.clone()));

    let exchange = config.exchange.exchange()?;
    let symbols = container
        .symbol_service(config.symbols.symbols())
        .tracked_symbols(exchange)
        .await
        .context("resolving tracked symbols")?;
    let stream_config = config
        .market_data
        .to_stream_config(config.exchange.environment);
    for symbol in &symbols {
        let stream = Arc::new(container.trade_stream(symbol.clone(), stream_config.clone()));
        tasks.spawn(stream.run(shutdown.clone()));
    }

    tracing::info!(
        tp_sl_orders = tp_sl.queue().len(),
        limit_orders = limit.queue().len(),
        streams = symbols.len(),
        "Order engine ready"
    );

    shutdown_signal().await;
    shutdown.cancel();

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Background tasks did not stop in time"
        );
        tasks.abort_all();
    }

    store.close().await;
    tracing::info!("Order engine stopped");
    Ok(())
}

/// Build the adapters and the container over them.
async fn create_container(config: &Config, store: &PgStore) -> anyhow::Result<EngineContainer> {
    let cache = RedisPriceCache::connect(&config.cache.url)
        .await
        .context("connecting to the price cache")?;

    let exchange = BinanceExchangeAdapter::new(&config.exchange.to_binance_config())
        .context("creating the Binance adapter")?;

    let cipher = AesCfbCipher::new(config.security.api_key_secret.as_bytes())?;
    let credentials = CredentialVault::new(Arc::new(store.api_keys()), Arc::new(cipher));

    let notifier = match config.notifier.kind {
        NotifierKind::Log => ConfiguredNotifier::Log(TracingNotifier),
        NotifierKind::Telegram => ConfiguredNotifier::Telegram(TelegramNotifier::new(
            &config.notifier.telegram_api_url,
            config.notifier.telegram_token.as_deref().unwrap_or_default(),
        )?),
    };

    Ok(Container::new(
        Arc::new(store.orders()),
        Arc::new(store.default_symbols()),
        Arc::new(exchange),
        Arc::new(cache),
        Arc::new(credentials),
        Arc::new(notifier),
    ))
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Initialize the tracing subscriber with environment filter.
///
/// Uses a static directive string that is guaranteed to parse.
#[allow(clippy::expect_used)]
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        "order_engine=info"
            .parse()
            .expect("static directive 'order_engine=info' is valid"),
    );

    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
