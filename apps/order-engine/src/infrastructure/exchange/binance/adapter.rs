//! Binance exchange adapter implementing `ExchangePort`.

use async_trait::async_trait;
use reqwest::Method;

use crate::application::ports::{
    ApiCredentials, CancelOrderRequest, ExchangeError, ExchangeOrder, ExchangePort,
    PlaceOrderRequest, UpdateOrderRequest,
};
use crate::domain::account::{Balance, Depth};
use crate::domain::shared::{Exchange, ExchangeOrderId, Symbol};

use super::api_types::{
    AccountInfo, BinanceOrder, DepthSnapshot, ExchangeInfo, NewOrderAck, order_params,
};
use super::config::{BinanceConfig, BinanceEnvironment};
use super::error::BinanceError;
use super::http_client::BinanceHttpClient;

/// Binance spot adapter.
#[derive(Debug, Clone)]
pub struct BinanceExchangeAdapter {
    client: BinanceHttpClient,
    environment: BinanceEnvironment,
}

impl BinanceExchangeAdapter {
    /// Create a new adapter.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &BinanceConfig) -> Result<Self, BinanceError> {
        Ok(Self {
            client: BinanceHttpClient::new(config)?,
            environment: config.environment,
        })
    }

    /// Check if orders go to the production API.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.environment.is_live()
    }
}

#[async_trait]
impl ExchangePort for BinanceExchangeAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn create_order(
        &self,
        credentials: &ApiCredentials,
        request: &PlaceOrderRequest,
    ) -> Result<ExchangeOrderId, ExchangeError> {
        tracing::info!(
            client_order_id = %request.client_order_id,
            symbol = %request.symbol,
            side = %request.side,
            order_type = %request.order_type,
            quantity = %request.quantity,
            price = ?request.price,
            live = self.is_live(),
            "Submitting order to Binance"
        );

        let ack: NewOrderAck = self
            .client
            .signed(
                Method::POST,
                "/api/v3/order",
                credentials,
                &order_params(request),
            )
            .await?;

        let exec_order_id = ExchangeOrderId::new(ack.order_id);
        tracing::info!(
            client_order_id = %request.client_order_id,
            exec_order_id = %exec_order_id,
            "Order accepted"
        );
        Ok(exec_order_id)
    }

    async fn cancel_order(
        &self,
        credentials: &ApiCredentials,
        request: &CancelOrderRequest,
    ) -> Result<(), ExchangeError> {
        tracing::info!(
            exec_order_id = %request.exec_order_id,
            symbol = %request.symbol,
            "Canceling order"
        );

        let _: serde_json::Value = self
            .client
            .signed(
                Method::DELETE,
                "/api/v3/order",
                credentials,
                &[
                    ("symbol", request.symbol.as_str().to_string()),
                    ("orderId", request.exec_order_id.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn update_order(
        &self,
        credentials: &ApiCredentials,
        request: &UpdateOrderRequest,
    ) -> Result<ExchangeOrderId, ExchangeError> {
        let cancel =
            CancelOrderRequest::new(request.replacement.symbol.clone(), request.exec_order_id);
        self.cancel_order(credentials, &cancel).await?;
        self.create_order(credentials, &request.replacement).await
    }

    async fn balance(&self, credentials: &ApiCredentials) -> Result<Balance, ExchangeError> {
        let account: AccountInfo = self
            .client
            .signed(Method::GET, "/api/v3/account", credentials, &[])
            .await?;
        Ok(account.to_balance()?)
    }

    async fn get_open_orders(
        &self,
        credentials: &ApiCredentials,
        symbol: Option<&Symbol>,
    ) -> Result<Vec<ExchangeOrder>, ExchangeError> {
        let params: Vec<(&'static str, String)> = symbol
            .map(|s| ("symbol", s.as_str().to_string()))
            .into_iter()
            .collect();
        let orders: Vec<BinanceOrder> = self
            .client
            .signed(Method::GET, "/api/v3/openOrders", credentials, &params)
            .await?;

        orders
            .iter()
            .map(|o| o.to_exchange_order().map_err(ExchangeError::from))
            .collect()
    }

    async fn get_order(
        &self,
        credentials: &ApiCredentials,
        symbol: &Symbol,
        exec_order_id: ExchangeOrderId,
    ) -> Result<ExchangeOrder, ExchangeError> {
        let order: BinanceOrder = self
            .client
            .signed(
                Method::GET,
                "/api/v3/order",
                credentials,
                &[
                    ("symbol", symbol.as_str().to_string()),
                    ("orderId", exec_order_id.to_string()),
                ],
            )
            .await?;
        Ok(order.to_exchange_order()?)
    }

    async fn get_symbols(
        &self,
        _credentials: &ApiCredentials,
    ) -> Result<Vec<Symbol>, ExchangeError> {
        let info: ExchangeInfo = self.client.public_get("/api/v3/exchangeInfo", &[]).await?;
        Ok(info.trading_symbols())
    }

    async fn depth(&self, symbol: &Symbol, limit: u16) -> Result<Depth, ExchangeError> {
        let snapshot: DepthSnapshot = self
            .client
            .public_get(
                "/api/v3/depth",
                &[
                    ("symbol", symbol.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(snapshot.to_depth()?)
    }
}
