//! Binance raw trade stream (`<symbol>@trade`) feeding the price cache.

use std::str::FromStr;
use std::sync::Arc;

use futures_util::{Sink, SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use super::reconnect::ReconnectPolicy;
use super::{MarketDataError, StreamConfig};
use crate::application::ports::PriceCachePort;
use crate::domain::shared::{Exchange, Symbol};

/// Fields of a stream frame the ticker cares about.
#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(rename = "e")]
    event_type: Option<String>,
    #[serde(rename = "p")]
    price: Option<String>,
}

/// Extract the traded price from a stream frame.
///
/// Returns `Ok(None)` for frames that are not trade events.
///
/// # Errors
///
/// Returns `ParseError` if the frame is not JSON or the price is missing or
/// not a decimal.
pub fn parse_trade_price(text: &str) -> Result<Option<String>, MarketDataError> {
    let frame: StreamFrame =
        serde_json::from_str(text).map_err(|e| MarketDataError::ParseError {
            message: e.to_string(),
        })?;

    if frame.event_type.as_deref() != Some("trade") {
        return Ok(None);
    }

    let price = frame.price.ok_or_else(|| MarketDataError::ParseError {
        message: "trade event without price".to_string(),
    })?;

    Decimal::from_str(&price).map_err(|_| MarketDataError::ParseError {
        message: format!("invalid trade price '{price}'"),
    })?;

    Ok(Some(price))
}

/// Streams trades of one symbol into the price cache.
pub struct TradeStreamTicker<C>
where
    C: PriceCachePort + 'static,
{
    exchange: Exchange,
    symbol: Symbol,
    cache: Arc<C>,
    config: StreamConfig,
}

impl<C> std::fmt::Debug for TradeStreamTicker<C>
where
    C: PriceCachePort + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeStreamTicker")
            .field("exchange", &self.exchange)
            .field("symbol", &self.symbol)
            .field("stream_url", &self.config.stream_url)
            .finish_non_exhaustive()
    }
}

impl<C> TradeStreamTicker<C>
where
    C: PriceCachePort + 'static,
{
    /// Create a ticker for `symbol` on `exchange`.
    pub const fn new(exchange: Exchange, symbol: Symbol, cache: Arc<C>, config: StreamConfig) -> Self {
        Self {
            exchange,
            symbol,
            cache,
            config,
        }
    }

    /// Symbol this ticker streams.
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Full stream URL, e.g. `wss://stream.binance.com:9443/ws/btcusdt@trade`.
    pub fn stream_url(&self) -> String {
        format!(
            "{}/{}@trade",
            self.config.stream_url.trim_end_matches('/'),
            self.symbol.to_stream_name()
        )
    }

    /// Consume the stream until shutdown, reconnecting per the configured policy.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut reconnect = ReconnectPolicy::new(&self.config);

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.connect_and_run(&mut reconnect, &shutdown).await {
                Ok(()) => break,
                Err(e) if !self.config.reconnect_enabled => {
                    tracing::error!(
                        symbol = %self.symbol,
                        error = %e,
                        "Trade stream failed, reconnect disabled"
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(symbol = %self.symbol, error = %e, "Trade stream error");

                    if let Some(backoff) = reconnect.next_backoff() {
                        tracing::info!(
                            symbol = %self.symbol,
                            backoff_ms = backoff.as_millis(),
                            attempt = reconnect.current_attempt(),
                            "Reconnecting trade stream"
                        );

                        tokio::select! {
                            () = tokio::time::sleep(backoff) => {}
                            () = shutdown.cancelled() => break,
                        }
                    } else {
                        tracing::error!(
                            symbol = %self.symbol,
                            "Trade stream reconnection attempts exhausted"
                        );
                        break;
                    }
                }
            }
        }

        tracing::info!(symbol = %self.symbol, "Trade stream stopped");
    }

    /// One connection lifetime. `Ok` only on shutdown.
    async fn connect_and_run(
        &self,
        reconnect: &mut ReconnectPolicy,
        shutdown: &CancellationToken,
    ) -> Result<(), MarketDataError> {
        let url = self.stream_url();
        tracing::info!(url, "Connecting to trade stream");

        let (ws_stream, _) = tokio::select! {
            connected = connect_async(url.as_str()) => {
                connected.map_err(|e| MarketDataError::ConnectionFailed {
                    message: e.to_string(),
                })?
            }
            () = shutdown.cancelled() => return Ok(()),
        };

        reconnect.reset();
        tracing::info!(symbol = %self.symbol, "Trade stream connected");

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_frame(&text.to_string()).await,
                        Some(Ok(Message::Ping(data))) => {
                            send_control(&mut write, Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            return Err(MarketDataError::ConnectionClosed {
                                reason: frame.map_or_else(
                                    || "close frame".to_string(),
                                    |f| f.reason.to_string(),
                                ),
                            });
                        }
                        Some(Err(e)) => {
                            return Err(MarketDataError::ConnectionClosed {
                                reason: e.to_string(),
                            });
                        }
                        None => {
                            return Err(MarketDataError::ConnectionClosed {
                                reason: "stream ended".to_string(),
                            });
                        }
                        _ => {}
                    }
                }
                () = shutdown.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }

    /// Bad frames and cache failures are logged and skipped.
    async fn handle_frame(&self, text: &str) {
        match parse_trade_price(text) {
            Ok(Some(price)) => {
                if let Err(e) = self
                    .cache
                    .publish_price(self.exchange, &self.symbol, &price)
                    .await
                {
                    tracing::warn!(symbol = %self.symbol, error = %e, "Failed to publish price");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(symbol = %self.symbol, error = %e, "Skipping trade frame");
            }
        }
    }
}

/// Write a control frame. A failed write means the connection is gone.
async fn send_control<S>(write: &mut S, message: Message) -> Result<(), MarketDataError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    write
        .send(message)
        .await
        .map_err(|e| MarketDataError::ConnectionClosed {
            reason: format!("control frame write failed: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::price_cache::InMemoryPriceCache;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio::net::TcpListener;

    const TRADE: &str = r#"{"e":"trade","E":1672515782136,"s":"BTCUSDT","t":12345,"p":"16850.12000000","q":"0.00100000","T":1672515782136,"m":true,"M":true}"#;

    fn trade_frame(price: &str) -> String {
        format!(r#"{{"e":"trade","s":"BTCUSDT","p":"{price}","q":"1"}}"#)
    }

    fn ticker(url: &str, cache: Arc<InMemoryPriceCache>) -> Arc<TradeStreamTicker<InMemoryPriceCache>> {
        let config = StreamConfig {
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            ..StreamConfig::new(url)
        };
        Arc::new(TradeStreamTicker::new(
            Exchange::Binance,
            Symbol::new("BTCUSDT"),
            cache,
            config,
        ))
    }

    async fn wait_for_price(cache: &InMemoryPriceCache, expected: Decimal) -> bool {
        for _ in 0..100 {
            if cache
                .last_price(Exchange::Binance, &Symbol::new("BTCUSDT"))
                .await
                .unwrap()
                == Some(expected)
            {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[test]
    fn parses_trade_price_verbatim() {
        assert_eq!(
            parse_trade_price(TRADE).unwrap().as_deref(),
            Some("16850.12000000")
        );
    }

    #[test]
    fn ignores_non_trade_events() {
        assert_eq!(parse_trade_price(r#"{"result":null,"id":1}"#).unwrap(), None);
        assert_eq!(
            parse_trade_price(r#"{"e":"aggTrade","p":"1.0"}"#).unwrap(),
            None
        );
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(parse_trade_price("not json").is_err());
        assert!(parse_trade_price(r#"{"e":"trade"}"#).is_err());
        assert!(parse_trade_price(r#"{"e":"trade","p":"abc"}"#).is_err());
    }

    #[test]
    fn stream_url_uses_lowercase_symbol() {
        let cache = Arc::new(InMemoryPriceCache::new());
        let ticker = ticker("wss://stream.binance.com:9443/ws/", cache);
        assert_eq!(
            ticker.stream_url(),
            "wss://stream.binance.com:9443/ws/btcusdt@trade"
        );
    }

    #[tokio::test]
    async fn failed_pong_write_closes_connection() {
        let mut sink = Box::pin(futures_util::sink::unfold((), |(), _: Message| async {
            Err::<(), _>(tungstenite::Error::ConnectionClosed)
        }));
        let err = send_control(&mut sink, Message::Pong(Vec::new().into()))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketDataError::ConnectionClosed { .. }));
    }

    #[tokio::test]
    async fn publishes_trades_and_skips_bad_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(trade_frame("100.5").into())).await.unwrap();
            ws.send(Message::Text("garbage".to_string().into())).await.unwrap();
            ws.send(Message::Text(trade_frame("101.25").into())).await.unwrap();
            // hold the connection open until the client leaves
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        });

        let cache = Arc::new(InMemoryPriceCache::new());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            ticker(&format!("ws://{addr}"), Arc::clone(&cache)).run(shutdown.clone()),
        );

        assert!(wait_for_price(&cache, dec!(101.25)).await);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn reconnects_after_drop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            // first connection is dropped right after the handshake
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            drop(ws);

            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(trade_frame("42").into())).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        });

        let cache = Arc::new(InMemoryPriceCache::new());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            ticker(&format!("ws://{addr}"), Arc::clone(&cache)).run(shutdown.clone()),
        );

        assert!(wait_for_price(&cache, dec!(42)).await);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn drop_ends_ticker_when_reconnect_disabled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            drop(ws);
        });

        let cache = Arc::new(InMemoryPriceCache::new());
        let ticker = Arc::new(TradeStreamTicker::new(
            Exchange::Binance,
            Symbol::new("BTCUSDT"),
            cache,
            StreamConfig::new(format!("ws://{addr}")).without_reconnect(),
        ));

        tokio::time::timeout(Duration::from_secs(2), ticker.run(CancellationToken::new()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_before_start_returns_immediately() {
        let cache = Arc::new(InMemoryPriceCache::new());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(
            Duration::from_secs(1),
            ticker("ws://127.0.0.1:9", cache).run(shutdown),
        )
        .await
        .unwrap();
    }
}
