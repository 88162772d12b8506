//! Account Service
//!
//! On-demand reads of exchange state for a user: balances, open orders,
//! tradable symbols and order book depth.

use std::sync::Arc;

use crate::application::ports::{
    ApiCredentials, CredentialsPort, ExchangeError, ExchangeOrder, ExchangePort,
};
use crate::domain::account::{Balance, Depth};
use crate::domain::shared::{Exchange, Symbol, UserId};
use crate::error::EngineError;

/// Depth levels returned when the caller does not ask for a specific count.
pub const DEFAULT_DEPTH_LIMIT: u16 = 20;

/// Read-only account queries.
#[derive(Debug)]
pub struct AccountService<X, P>
where
    X: ExchangePort,
    P: CredentialsPort,
{
    exchange: Arc<X>,
    credentials: Arc<P>,
}

impl<X, P> AccountService<X, P>
where
    X: ExchangePort,
    P: CredentialsPort,
{
    /// Create a new service.
    pub const fn new(exchange: Arc<X>, credentials: Arc<P>) -> Self {
        Self {
            exchange,
            credentials,
        }
    }

    async fn credentials(
        &self,
        user_id: UserId,
        exchange: Exchange,
    ) -> Result<ApiCredentials, EngineError> {
        if exchange != self.exchange.exchange() {
            return Err(ExchangeError::Unsupported { exchange }.into());
        }
        Ok(self.credentials.resolve(user_id, exchange).await?)
    }

    /// Non-zero holdings of the user.
    ///
    /// # Errors
    ///
    /// Not-found without keys; bad-request if the exchange call fails.
    pub async fn balance(&self, user_id: UserId, exchange: Exchange) -> Result<Balance, EngineError> {
        let credentials = self.credentials(user_id, exchange).await?;
        self.exchange
            .balance(&credentials)
            .await
            .map(Balance::non_zero)
            .map_err(|e| EngineError::bad_request(e.to_string()))
    }

    /// Orders open on the exchange, optionally for one symbol.
    ///
    /// # Errors
    ///
    /// Not-found without keys; the mapped exchange error otherwise.
    pub async fn open_orders(
        &self,
        user_id: UserId,
        exchange: Exchange,
        symbol: Option<&Symbol>,
    ) -> Result<Vec<ExchangeOrder>, EngineError> {
        let credentials = self.credentials(user_id, exchange).await?;
        Ok(self.exchange.get_open_orders(&credentials, symbol).await?)
    }

    /// Symbols tradable on the exchange.
    ///
    /// # Errors
    ///
    /// Not-found without keys; the mapped exchange error otherwise.
    pub async fn symbols(
        &self,
        user_id: UserId,
        exchange: Exchange,
    ) -> Result<Vec<Symbol>, EngineError> {
        let credentials = self.credentials(user_id, exchange).await?;
        Ok(self.exchange.get_symbols(&credentials).await?)
    }

    /// Order book snapshot. Public; needs no credentials.
    ///
    /// # Errors
    ///
    /// The mapped exchange error.
    pub async fn depth(
        &self,
        exchange: Exchange,
        symbol: &Symbol,
        limit: Option<u16>,
    ) -> Result<Depth, EngineError> {
        if exchange != self.exchange.exchange() {
            return Err(ExchangeError::Unsupported { exchange }.into());
        }
        symbol.validate()?;
        Ok(self
            .exchange
            .depth(symbol, limit.unwrap_or(DEFAULT_DEPTH_LIMIT))
            .await?)
    }
}
