//! End-to-end order flows through the container.
//!
//! Wires the in-memory stores and price cache, a Binance adapter pointed at a
//! mock server and a credential vault holding AES-encrypted keys, then drives
//! commands and ticker sweeps the way the binary does.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use serde_json::json;
use sha2::Sha256;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use order_engine::application::ports::{Notification, NotifierPort, NotifyError, PriceCachePort};
use order_engine::application::services::CredentialVault;
use order_engine::application::{Evaluation, TickerConfig};
use order_engine::domain::account::ApiKeys;
use order_engine::domain::order_execution::{Order, OrderStatus, TpSlRole};
use order_engine::infrastructure::crypto::AesCfbCipher;
use order_engine::infrastructure::exchange::binance::RetryConfig;
use order_engine::infrastructure::persistence::{
    InMemoryApiKeyRepository, InMemoryDefaultSymbolRepository, InMemoryOrderRepository,
};
use order_engine::infrastructure::price_cache::InMemoryPriceCache;
use order_engine::{
    BinanceConfig, BinanceEnvironment, BinanceExchangeAdapter, Command, CommandOutcome, Container,
    EngineCommand, ErrorCode, Exchange, ExchangeOrderId, Symbol, UserId,
};

const USER: UserId = UserId::new(42);
const STRANGER: UserId = UserId::new(43);
const SECRET: &str = "0123456789abcdef0123456789abcdef";
const PUB_KEY: &str = "pub-key";
const PRIV_KEY: &str = "binance-secret";

type TestContainer = Container<
    InMemoryOrderRepository,
    InMemoryDefaultSymbolRepository,
    BinanceExchangeAdapter,
    InMemoryPriceCache,
    CredentialVault<InMemoryApiKeyRepository, AesCfbCipher>,
    RecordingNotifier,
>;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(UserId, Notification)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(UserId, Notification)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotifierPort for RecordingNotifier {
    async fn notify(
        &self,
        user_id: UserId,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        self.sent.lock().push((user_id, notification.clone()));
        Ok(())
    }
}

/// Matches requests whose `signature` is the HMAC of the rest of the query.
struct SignedWith(&'static str);

impl Match for SignedWith {
    fn matches(&self, request: &Request) -> bool {
        let Some((payload, signature)) = request
            .url
            .query()
            .and_then(|query| query.rsplit_once("&signature="))
        else {
            return false;
        };
        let mut mac = Hmac::<Sha256>::new_from_slice(self.0.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes()) == signature
    }
}

struct Harness {
    server: MockServer,
    container: TestContainer,
    orders: Arc<InMemoryOrderRepository>,
    cache: Arc<InMemoryPriceCache>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    async fn start() -> Self {
        let server = MockServer::start().await;

        let cipher = AesCfbCipher::new(SECRET).unwrap();
        let keys = InMemoryApiKeyRepository::new();
        keys.add(ApiKeys {
            user_id: USER,
            exchange: Exchange::Binance,
            pub_key: PUB_KEY.to_string(),
            priv_key: cipher.encrypt(PRIV_KEY).unwrap(),
            passphrase: None,
        });

        let exchange = BinanceExchangeAdapter::new(
            &BinanceConfig::new(BinanceEnvironment::Testnet)
                .with_base_url(server.uri())
                .with_retry(RetryConfig {
                    max_attempts: 1,
                    initial_backoff: Duration::from_millis(1),
                    max_backoff: Duration::from_millis(1),
                    multiplier: 1.0,
                }),
        )
        .unwrap();

        let orders = Arc::new(InMemoryOrderRepository::new());
        let cache = Arc::new(InMemoryPriceCache::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let container = Container::new(
            Arc::clone(&orders),
            Arc::new(InMemoryDefaultSymbolRepository::default()),
            Arc::new(exchange),
            Arc::clone(&cache),
            Arc::new(CredentialVault::new(Arc::new(keys), Arc::new(cipher))),
            Arc::clone(&notifier),
        );

        Self {
            server,
            container,
            orders,
            cache,
            notifier,
        }
    }

    /// Accept every signed order placement for `side` with `order_id`.
    async fn accept_orders(&self, side: &str, order_id: i64) {
        Mock::given(method("POST"))
            .and(path("/api/v3/order"))
            .and(header("X-MBX-APIKEY", PUB_KEY))
            .and(query_param("side", side))
            .and(SignedWith(PRIV_KEY))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"symbol": "BTCUSDT", "orderId": order_id})),
            )
            .mount(&self.server)
            .await;
    }

    async fn set_price(&self, price: &str) {
        self.cache
            .set("pairPrice_binance_BTCUSDT", price)
            .await
            .unwrap();
    }

    async fn send(&self, user: UserId, raw: &str) -> Result<CommandOutcome, ErrorCode> {
        let command: EngineCommand = serde_json::from_str(raw).unwrap();
        let command = Command::try_from(command).map_err(|e| e.code())?;
        self.container
            .execution()
            .handle(user, command)
            .await
            .map_err(|e| e.code())
    }

    async fn leg(&self, role: TpSlRole) -> Order {
        self.orders
            .orders()
            .await
            .into_iter()
            .find(|order| order.role() == role)
            .unwrap()
    }
}

fn ticker_config() -> TickerConfig {
    TickerConfig::every(Duration::from_millis(10))
}

fn binance_order(status: &str) -> serde_json::Value {
    json!({
        "symbol": "BTCUSDT",
        "orderId": 5001,
        "price": "30000.00",
        "origQty": "0.5",
        "executedQty": "0.5",
        "status": status,
        "type": "LIMIT",
        "side": "BUY"
    })
}

async fn settle(handles: Vec<tokio::task::JoinHandle<Evaluation>>) -> Vec<Evaluation> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

const MARKET_BUY: &str = r#"{
    "command": "create",
    "exchange": "binance",
    "ccy": "BTCUSDT",
    "type": "MARKET",
    "side": "BUY",
    "qty": "0.5",
    "tp_percent": "10",
    "sl_percent": "5"
}"#;

const LIMIT_BUY: &str = r#"{
    "command": "create",
    "exchange": "binance",
    "ccy": "BTCUSDT",
    "type": "LIMIT",
    "side": "BUY",
    "qty": "0.5",
    "price": "30000",
    "tp_percent": "10",
    "sl_price": "28000"
}"#;

// ============================================================================
// Market orders and TP/SL execution
// ============================================================================

#[tokio::test]
async fn market_order_take_profit_fires_and_cancels_stop_loss() {
    let h = Harness::start().await;
    h.accept_orders("BUY", 5001).await;
    h.accept_orders("SELL", 6001).await;
    h.set_price("100").await;

    let CommandOutcome::Created(base) = h.send(USER, MARKET_BUY).await.unwrap() else {
        panic!("expected a created order");
    };
    assert_eq!(base.status(), OrderStatus::Filled);
    assert_eq!(base.price(), dec!(100));
    assert_eq!(base.exec_order_id(), ExchangeOrderId::new(5001));

    let ticker = Arc::new(h.container.tp_sl_ticker(ticker_config()).await.unwrap());
    assert_eq!(ticker.queue().order_count(), 2);

    // Inside the band nothing fires.
    h.set_price("104").await;
    let results = settle(ticker.sweep()).await;
    assert!(results.iter().all(|r| *r == Evaluation::Waiting));

    h.set_price("111").await;
    let results = settle(ticker.sweep()).await;
    assert!(results.contains(&Evaluation::Executed(ExchangeOrderId::new(6001))));
    assert!(ticker.queue().is_empty());

    let tp = h.leg(TpSlRole::TakeProfit).await;
    let sl = h.leg(TpSlRole::StopLoss).await;
    assert_eq!(tp.status(), OrderStatus::Filled);
    assert_eq!(tp.fill_order_id(), Some(ExchangeOrderId::new(6001)));
    // The stored trigger price is left as configured.
    assert_eq!(tp.price(), dec!(110));
    assert_eq!(sl.status(), OrderStatus::Canceled);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    let (user, Notification::TpSlExecuted { role, price, exec_order_id, .. }) = &sent[0] else {
        panic!("expected an execution notification");
    };
    assert_eq!(*user, USER);
    assert_eq!(*role, TpSlRole::TakeProfit);
    assert_eq!(*price, dec!(111));
    assert_eq!(*exec_order_id, ExchangeOrderId::new(6001));

    // A later sweep has nothing left to do.
    assert!(settle(ticker.sweep()).await.is_empty());
}

#[tokio::test]
async fn rejected_leg_stays_armed_and_user_is_told() {
    let h = Harness::start().await;
    h.accept_orders("BUY", 5001).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/order"))
        .and(query_param("side", "SELL"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": -2010,
            "msg": "Account has insufficient balance for requested action."
        })))
        .mount(&h.server)
        .await;
    h.set_price("100").await;
    h.send(USER, MARKET_BUY).await.unwrap();

    let ticker = Arc::new(h.container.tp_sl_ticker(ticker_config()).await.unwrap());
    h.set_price("90").await;
    let results = settle(ticker.sweep()).await;

    assert!(results.contains(&Evaluation::Failed));
    assert_eq!(ticker.queue().order_count(), 2);
    assert_eq!(h.leg(TpSlRole::StopLoss).await.status(), OrderStatus::Active);
    assert_eq!(h.leg(TpSlRole::TakeProfit).await.status(), OrderStatus::Active);

    let sent = h.notifier.sent();
    assert!(matches!(
        sent.as_slice(),
        [(_, Notification::TpSlFailed { role: TpSlRole::StopLoss, .. })]
    ));
}

#[tokio::test]
async fn market_order_without_keys_is_not_found() {
    let h = Harness::start().await;
    h.set_price("100").await;

    assert_eq!(h.send(STRANGER, MARKET_BUY).await.unwrap_err(), ErrorCode::NotFound);
    assert!(h.orders.orders().await.is_empty());
}

// ============================================================================
// Limit orders
// ============================================================================

#[tokio::test]
async fn limit_fill_arms_its_legs() {
    let h = Harness::start().await;
    h.accept_orders("BUY", 5001).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/order"))
        .and(query_param("orderId", "5001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(binance_order("NEW")))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/order"))
        .and(query_param("orderId", "5001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(binance_order("FILLED")))
        .mount(&h.server)
        .await;

    let CommandOutcome::Created(base) = h.send(USER, LIMIT_BUY).await.unwrap() else {
        panic!("expected a created order");
    };
    assert_eq!(base.status(), OrderStatus::Active);
    assert_eq!(h.leg(TpSlRole::TakeProfit).await.price(), dec!(33000));
    assert_eq!(h.leg(TpSlRole::StopLoss).await.price(), dec!(28000));

    let limit = Arc::new(h.container.limit_order_ticker(ticker_config()).await.unwrap());
    let tp_sl = h.container.tp_sl_ticker(ticker_config()).await.unwrap();
    assert_eq!(limit.queue().order_count(), 1);
    assert!(tp_sl.queue().is_empty());

    assert_eq!(settle(limit.sweep()).await, vec![Evaluation::Waiting]);
    assert_eq!(settle(limit.sweep()).await, vec![Evaluation::Filled]);

    assert!(limit.queue().is_empty());
    assert_eq!(tp_sl.queue().order_count(), 2);
    let stored = h.orders.order(base.id()).await.unwrap();
    assert_eq!(stored.status(), OrderStatus::Filled);
    assert_eq!(h.leg(TpSlRole::TakeProfit).await.status(), OrderStatus::Active);
    assert_eq!(h.leg(TpSlRole::StopLoss).await.status(), OrderStatus::Active);
}

#[tokio::test]
async fn limit_order_without_price_is_rejected_before_the_exchange() {
    let h = Harness::start().await;
    let raw = LIMIT_BUY.replace(r#""price": "30000","#, "");

    assert_eq!(h.send(USER, &raw).await.unwrap_err(), ErrorCode::Validation);
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Cancel and TP/SL updates
// ============================================================================

#[tokio::test]
async fn cancel_resting_order_cancels_legs() {
    let h = Harness::start().await;
    h.accept_orders("BUY", 5001).await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/order"))
        .and(query_param("orderId", "5001"))
        .and(SignedWith(PRIV_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orderId": 5001})))
        .expect(1)
        .mount(&h.server)
        .await;

    let CommandOutcome::Created(base) = h.send(USER, LIMIT_BUY).await.unwrap() else {
        panic!("expected a created order");
    };
    let limit = h.container.limit_order_ticker(ticker_config()).await.unwrap();
    assert_eq!(limit.queue().order_count(), 1);

    let cancel = format!(
        r#"{{"command":"cancel","id":{},"ccy":"BTCUSDT","exchange":"binance"}}"#,
        base.id()
    );
    assert_eq!(h.send(STRANGER, &cancel).await.unwrap_err(), ErrorCode::NotFound);
    assert!(matches!(
        h.send(USER, &cancel).await.unwrap(),
        CommandOutcome::Canceled
    ));

    assert!(limit.queue().is_empty());
    for order in h.orders.orders().await {
        assert_eq!(order.status(), OrderStatus::Canceled, "{order:?}");
    }

    // Canceling twice is refused.
    assert_eq!(h.send(USER, &cancel).await.unwrap_err(), ErrorCode::BadRequest);
}

#[tokio::test]
async fn tp_sl_update_moves_the_live_trigger() {
    let h = Harness::start().await;
    h.accept_orders("BUY", 5001).await;
    h.accept_orders("SELL", 6001).await;
    h.set_price("100").await;

    let CommandOutcome::Created(base) = h.send(USER, MARKET_BUY).await.unwrap() else {
        panic!("expected a created order");
    };
    let ticker = Arc::new(h.container.tp_sl_ticker(ticker_config()).await.unwrap());

    let update = format!(
        r#"{{"command":"updateTpsl","id":{},"symbol":"BTCUSDT","exchange":"binance","tpPercent":"20"}}"#,
        base.id()
    );
    let CommandOutcome::TpSlUpdated(updated) = h.send(USER, &update).await.unwrap() else {
        panic!("expected updated legs");
    };
    assert_eq!(updated, vec![(TpSlRole::TakeProfit, dec!(120))]);

    let tp = h.leg(TpSlRole::TakeProfit).await;
    assert_eq!(tp.price(), dec!(120));
    let live = ticker.queue().get(&Symbol::new("BTCUSDT"), tp.id()).unwrap();
    assert_eq!(live.price(), dec!(120));

    // The old trigger no longer fires.
    h.set_price("111").await;
    let results = settle(ticker.sweep()).await;
    assert!(results.iter().all(|r| *r == Evaluation::Waiting));

    h.set_price("121").await;
    let results = settle(ticker.sweep()).await;
    assert!(results.contains(&Evaluation::Executed(ExchangeOrderId::new(6001))));
    assert_eq!(h.leg(TpSlRole::StopLoss).await.status(), OrderStatus::Canceled);
}

#[tokio::test]
async fn tp_sl_update_needs_a_change() {
    let h = Harness::start().await;
    let update =
        r#"{"command":"updateTpsl","id":1,"symbol":"BTCUSDT","exchange":"binance"}"#;

    assert_eq!(h.send(USER, update).await.unwrap_err(), ErrorCode::Validation);
}

// ============================================================================
// Account reads
// ============================================================================

#[tokio::test]
async fn account_reads_use_decrypted_keys() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/account"))
        .and(SignedWith(PRIV_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "balances": [
                {"asset": "BTC", "free": "0.25", "locked": "0"},
                {"asset": "ETH", "free": "0.00000000", "locked": "0"},
                {"asset": "USDT", "free": "1500", "locked": "250"}
            ]
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/openOrders"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(SignedWith(PRIV_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([binance_order("NEW")])))
        .mount(&h.server)
        .await;

    let account = h.container.account_service();

    let balance = account.balance(USER, Exchange::Binance).await.unwrap();
    assert_eq!(balance.len(), 2);
    assert_eq!(balance.get("USDT").unwrap().quantity, dec!(1500));
    assert!(balance.get("ETH").is_none());

    let open = account
        .open_orders(USER, Exchange::Binance, Some(&Symbol::new("BTCUSDT")))
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].exec_order_id, ExchangeOrderId::new(5001));
    assert!(!open[0].is_filled());

    let err = account.balance(STRANGER, Exchange::Binance).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    let err = account.balance(USER, Exchange::Okx).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadRequest);
}
