//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driver Ports** (Primary/Inbound): How the tickers drive the engine
//! - **Driven Ports** (Secondary/Outbound): How the engine uses the exchange,
//!   the price cache, the key store and the user notifier

mod credentials_port;
mod exchange_port;
mod execution_port;
mod notifier_port;
mod price_cache_port;

pub use credentials_port::{
    ApiCredentials, CipherError, CredentialsError, CredentialsPort, SecretCipher,
};
pub use exchange_port::{
    CancelOrderRequest, ExchangeError, ExchangeOrder, ExchangePort, PlaceOrderRequest,
    UpdateOrderRequest,
};
pub use execution_port::{ExecutionOutcome, OrderExecutionPort};
pub use notifier_port::{NoOpNotifier, Notification, NotifierPort, NotifyError};
pub use price_cache_port::{CacheError, PRICE_KEY_PREFIX, PriceCachePort, price_key};
