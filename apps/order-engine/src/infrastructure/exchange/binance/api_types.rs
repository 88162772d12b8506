//! Binance API request and response types.
//!
//! These types map directly to the Binance spot REST API format. Numbers
//! arrive as strings and are parsed into `Decimal`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::BinanceError;
use crate::application::ports::{ExchangeOrder, PlaceOrderRequest};
use crate::domain::account::{AssetBalance, Balance, Depth, PriceLevel};
use crate::domain::order_execution::{OrderSide, OrderStatus, OrderType};
use crate::domain::shared::{ExchangeOrderId, Symbol};

// ============================================================================
// Request Parameters
// ============================================================================

/// Query parameters of `POST /api/v3/order`.
pub fn order_params(request: &PlaceOrderRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", request.symbol.as_str().to_string()),
        ("side", request.side.as_str().to_string()),
        ("type", request.order_type.as_str().to_string()),
        ("quantity", request.quantity.normalize().to_string()),
        ("newClientOrderId", request.client_order_id.clone()),
        ("newOrderRespType", "ACK".to_string()),
    ];

    if request.order_type != OrderType::Market {
        if let Some(price) = request.price {
            params.push(("price", price.normalize().to_string()));
        }
        let tif = request.time_in_force.unwrap_or_default();
        params.push(("timeInForce", tif.as_str().to_string()));
    }
    if request.order_type == OrderType::StopLossLimit {
        if let Some(stop_price) = request.stop_price {
            params.push(("stopPrice", stop_price.normalize().to_string()));
        }
    }

    params
}

// ============================================================================
// Responses
// ============================================================================

/// Error body.
#[derive(Debug, Clone, Deserialize)]
pub struct BinanceErrorResponse {
    /// Binance error code.
    pub code: i64,
    /// Error message.
    pub msg: String,
}

/// `ACK` response to an order placement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderAck {
    /// Symbol.
    #[allow(dead_code)]
    pub symbol: String,
    /// Exchange order ID.
    pub order_id: i64,
}

/// Order as returned by the order endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceOrder {
    /// Symbol.
    pub symbol: String,
    /// Exchange order ID.
    pub order_id: i64,
    /// Limit price.
    pub price: String,
    /// Ordered quantity.
    pub orig_qty: String,
    /// Executed quantity.
    pub executed_qty: String,
    /// Order status (`NEW`, `PARTIALLY_FILLED`, ...).
    pub status: String,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: String,
    /// Order side.
    pub side: String,
}

impl BinanceOrder {
    /// Convert to the port's order shape.
    pub fn to_exchange_order(&self) -> Result<ExchangeOrder, BinanceError> {
        let side = OrderSide::from_str(&self.side)
            .map_err(|e| BinanceError::JsonParse(format!("side: {e}")))?;

        Ok(ExchangeOrder {
            exec_order_id: ExchangeOrderId::new(self.order_id),
            symbol: Symbol::new(&self.symbol),
            side,
            order_type: OrderType::from_str(&self.order_type).ok(),
            status: map_status(&self.status),
            quantity: parse_decimal("origQty", &self.orig_qty)?,
            executed_quantity: parse_decimal("executedQty", &self.executed_qty)?,
            price: parse_decimal("price", &self.price)?,
        })
    }
}

/// `GET /api/v3/account`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    /// Per-asset balances.
    pub balances: Vec<BalanceEntry>,
}

/// One asset balance.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceEntry {
    /// Asset code.
    pub asset: String,
    /// Free amount.
    pub free: String,
    /// Amount locked in open orders.
    #[allow(dead_code)]
    pub locked: String,
}

impl AccountInfo {
    /// Free balances per asset.
    pub fn to_balance(&self) -> Result<Balance, BinanceError> {
        self.balances
            .iter()
            .map(|entry| {
                Ok(AssetBalance {
                    symbol: entry.asset.clone(),
                    quantity: parse_decimal("free", &entry.free)?,
                })
            })
            .collect::<Result<Vec<_>, BinanceError>>()
            .map(Balance)
    }
}

/// `GET /api/v3/exchangeInfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    /// Listed symbols.
    pub symbols: Vec<SymbolInfo>,
}

/// One listed symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    /// Symbol.
    pub symbol: String,
    /// Trading status (`TRADING`, `BREAK`, ...).
    pub status: String,
}

impl ExchangeInfo {
    /// Symbols currently trading.
    pub fn trading_symbols(&self) -> Vec<Symbol> {
        self.symbols
            .iter()
            .filter(|s| s.status == "TRADING")
            .map(|s| Symbol::new(&s.symbol))
            .collect()
    }
}

/// `GET /api/v3/depth`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthSnapshot {
    /// Book update id.
    pub last_update_id: i64,
    /// `[price, quantity]` bids.
    pub bids: Vec<(String, String)>,
    /// `[price, quantity]` asks.
    pub asks: Vec<(String, String)>,
}

impl DepthSnapshot {
    /// Convert to the domain depth.
    pub fn to_depth(&self) -> Result<Depth, BinanceError> {
        Ok(Depth {
            last_update_id: self.last_update_id,
            bids: levels(&self.bids)?,
            asks: levels(&self.asks)?,
        })
    }
}

fn levels(raw: &[(String, String)]) -> Result<Vec<PriceLevel>, BinanceError> {
    raw.iter()
        .map(|(price, quantity)| {
            Ok(PriceLevel {
                price: parse_decimal("price", price)?,
                quantity: parse_decimal("quantity", quantity)?,
            })
        })
        .collect()
}

/// Map a Binance order status onto local statuses. Every way an order can
/// close without filling maps to `Canceled`; transitional statuses with no
/// local counterpart map to `None`.
pub fn map_status(status: &str) -> Option<OrderStatus> {
    match status {
        "NEW" => Some(OrderStatus::Active),
        "PARTIALLY_FILLED" => Some(OrderStatus::PartFilled),
        "FILLED" => Some(OrderStatus::Filled),
        "CANCELED" | "EXPIRED" | "EXPIRED_IN_MATCH" | "REJECTED" => Some(OrderStatus::Canceled),
        _ => None,
    }
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, BinanceError> {
    Decimal::from_str(value).map_err(|_| BinanceError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
