//! Order DTOs
//!
//! Field names follow the front-end's JSON (`ccy`, `qty`, `tp_percent`, ...).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{Order, OrderSide, OrderStatus, OrderType, TpSlRole};

/// TP/SL settings attached to a create command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpSlSettingsDto {
    /// Take-profit distance in percent.
    #[serde(default)]
    pub tp_percent: Option<String>,
    /// Stop-loss distance in percent.
    #[serde(default)]
    pub sl_percent: Option<String>,
    /// Absolute take-profit price.
    #[serde(default)]
    pub tp_price: Option<String>,
    /// Absolute stop-loss price.
    #[serde(default)]
    pub sl_price: Option<String>,
    /// Order type used when the take-profit fires.
    #[serde(default)]
    pub tp_type: Option<String>,
    /// Order type used when the stop-loss fires.
    #[serde(default)]
    pub sl_type: Option<String>,
    /// Trailing-stop distance.
    #[serde(default)]
    pub ts: Option<String>,
}

/// DTO for creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderDto {
    /// Venue.
    pub exchange: String,
    /// Trading pair.
    #[serde(rename = "ccy")]
    pub symbol: String,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: String,
    /// Side.
    pub side: String,
    /// Quantity.
    pub qty: String,
    /// Limit price.
    #[serde(default)]
    pub price: Option<String>,
    /// Time in force.
    #[serde(default)]
    pub tif: Option<String>,
    /// Stop-loss-limit percent.
    #[serde(default, rename = "stopPercent")]
    pub stop_percent: Option<String>,
    /// Stop-loss-limit stop price.
    #[serde(default, rename = "stopPrice")]
    pub stop_price: Option<String>,
    /// TP/SL settings.
    #[serde(default, flatten)]
    pub tp_sl: TpSlSettingsDto,
}

/// DTO for canceling an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrderDto {
    /// Local order id.
    pub id: i64,
    /// Trading pair.
    pub ccy: String,
    /// Venue.
    pub exchange: String,
}

/// DTO for editing the TP/SL of a base order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTpSlDto {
    /// Local id of the base order.
    pub id: i64,
    /// Trading pair.
    pub symbol: String,
    /// Venue.
    pub exchange: String,
    /// New take-profit percent.
    #[serde(default)]
    pub tp_percent: Option<String>,
    /// New stop-loss percent.
    #[serde(default)]
    pub sl_percent: Option<String>,
    /// New take-profit price.
    #[serde(default)]
    pub tp_price: Option<String>,
    /// New stop-loss price.
    #[serde(default)]
    pub sl_price: Option<String>,
}

/// A command from the front-end, tagged by `command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum EngineCommand {
    /// Place an order.
    #[serde(rename = "create")]
    Create(CreateOrderDto),
    /// Cancel an order.
    #[serde(rename = "cancel")]
    Cancel(CancelOrderDto),
    /// Edit TP/SL settings.
    #[serde(rename = "updateTpsl")]
    UpdateTpSl(UpdateTpSlDto),
}

/// DTO representing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDto {
    /// Local id.
    pub id: i64,
    /// Exchange id of the base order.
    pub exec_order_id: i64,
    /// Trading pair.
    pub symbol: String,
    /// Side.
    pub side: OrderSide,
    /// Type.
    pub order_type: OrderType,
    /// Quantity.
    pub quantity: Decimal,
    /// Price.
    pub price: Decimal,
    /// Status.
    pub status: OrderStatus,
    /// Role.
    pub tp_sl: TpSlRole,
    /// Venue.
    pub exchange: String,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().value(),
            exec_order_id: order.exec_order_id().value(),
            symbol: order.symbol().to_string(),
            side: order.side(),
            order_type: order.order_type(),
            quantity: order.quantity(),
            price: order.price(),
            status: order.status(),
            tp_sl: order.role(),
            exchange: order.exchange().to_string(),
        }
    }
}
