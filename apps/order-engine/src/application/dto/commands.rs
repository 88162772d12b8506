//! Validated commands.
//!
//! The only inputs the execution service accepts. Conversion from the wire
//! DTOs performs every check that does not need the store or the exchange.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::order_dto::{CancelOrderDto, CreateOrderDto, EngineCommand, TpSlSettingsDto, UpdateTpSlDto};
use super::validation::{parse_decimal, parse_optional, parse_percent};
use crate::domain::order_execution::{
    LegSpec, Order, OrderSide, OrderType, Settings, TimeInForce, TpSlRole,
};
use crate::domain::shared::{Exchange, OrderId, Symbol};
use crate::error::EngineError;

/// Place an order, with optional TP/SL legs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    /// Venue.
    pub exchange: Exchange,
    /// Trading pair.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Type.
    pub order_type: OrderType,
    /// Quantity.
    pub quantity: Decimal,
    /// Limit price; for market orders, a fallback fill price.
    pub price: Option<Decimal>,
    /// Time in force, set for resting orders.
    pub time_in_force: Option<TimeInForce>,
    /// Stop-loss-limit percent.
    pub stop_percent: Option<Decimal>,
    /// Stop-loss-limit stop price.
    pub stop_price: Option<Decimal>,
    /// TP/SL settings; empty when no leg is requested.
    pub settings: Settings,
}

/// Cancel an order by local id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOrder {
    /// Local id.
    pub id: OrderId,
    /// Trading pair.
    pub symbol: Symbol,
    /// Venue.
    pub exchange: Exchange,
}

/// Replace the TP and/or SL definition of a base order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTpSl {
    /// Local id of the base order.
    pub id: OrderId,
    /// Trading pair.
    pub symbol: Symbol,
    /// Venue.
    pub exchange: Exchange,
    /// New take-profit; empty to keep the current one.
    pub take_profit: LegSpec,
    /// New stop-loss; empty to keep the current one.
    pub stop_loss: LegSpec,
}

/// A validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Place an order.
    Create(CreateOrder),
    /// Cancel an order.
    Cancel(CancelOrder),
    /// Edit TP/SL settings.
    UpdateTpSl(UpdateTpSl),
}

/// Result of a handled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The stored base order.
    Created(Order),
    /// The order is canceled.
    Canceled,
    /// New trigger prices per leg.
    TpSlUpdated(Vec<(TpSlRole, Decimal)>),
}

fn parse_symbol(raw: &str) -> Result<Symbol, EngineError> {
    let symbol = Symbol::new(raw);
    symbol.validate()?;
    Ok(symbol)
}

fn parse_enum<T: FromStr<Err = crate::domain::shared::DomainError>>(
    raw: &str,
) -> Result<T, EngineError> {
    T::from_str(raw).map_err(EngineError::from)
}

fn parse_leg(
    percent_field: &str,
    percent: Option<&str>,
    price_field: &str,
    price: Option<&str>,
    order_type: Option<&str>,
) -> Result<LegSpec, EngineError> {
    let order_type = match order_type.map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_enum::<OrderType>(raw)?),
    };
    if order_type == Some(OrderType::StopLossLimit) {
        return Err(EngineError::validation(
            "TP/SL legs execute as MARKET or LIMIT orders",
        ));
    }
    Ok(LegSpec {
        percent: parse_optional(percent_field, percent, parse_percent)?,
        price: parse_optional(price_field, price, parse_decimal)?,
        order_type,
    })
}

impl TryFrom<TpSlSettingsDto> for Settings {
    type Error = EngineError;

    fn try_from(dto: TpSlSettingsDto) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: OrderId::default(),
            take_profit: parse_leg(
                "tpPercent",
                dto.tp_percent.as_deref(),
                "tpPrice",
                dto.tp_price.as_deref(),
                dto.tp_type.as_deref(),
            )?,
            stop_loss: parse_leg(
                "slPercent",
                dto.sl_percent.as_deref(),
                "slPrice",
                dto.sl_price.as_deref(),
                dto.sl_type.as_deref(),
            )?,
            trailing_stop: parse_optional("ts", dto.ts.as_deref(), parse_percent)?,
        })
    }
}

impl TryFrom<CreateOrderDto> for CreateOrder {
    type Error = EngineError;

    fn try_from(dto: CreateOrderDto) -> Result<Self, Self::Error> {
        let exchange = parse_enum::<Exchange>(&dto.exchange)?;
        let symbol = parse_symbol(&dto.symbol)?;
        let side = parse_enum::<OrderSide>(&dto.side)?;
        let order_type = parse_enum::<OrderType>(&dto.order_type)?;
        let quantity = parse_decimal("qty", &dto.qty)?;
        let price = parse_optional("price", dto.price.as_deref(), parse_decimal)?;
        let stop_percent =
            parse_optional("stopPercent", dto.stop_percent.as_deref(), parse_percent)?;
        let stop_price = parse_optional("stopPrice", dto.stop_price.as_deref(), parse_decimal)?;

        if order_type == OrderType::Limit && price.is_none() {
            return Err(EngineError::validation("price is required for LIMIT orders"));
        }
        if order_type.requires_stop() && (stop_price.is_none() || stop_percent.is_none()) {
            return Err(EngineError::validation(
                "stopPrice and stopPercent are required for STOP_LOSS_LIMIT orders",
            ));
        }

        let time_in_force = if order_type.is_resting() {
            match dto.tif.as_deref().map(str::trim) {
                None | Some("") => Some(TimeInForce::Gtc),
                Some(raw) => Some(parse_enum::<TimeInForce>(raw)?),
            }
        } else {
            None
        };

        let settings = Settings::try_from(dto.tp_sl)?;

        Ok(Self {
            exchange,
            symbol,
            side,
            order_type,
            quantity,
            price,
            time_in_force,
            stop_percent,
            stop_price,
            settings,
        })
    }
}

impl TryFrom<CancelOrderDto> for CancelOrder {
    type Error = EngineError;

    fn try_from(dto: CancelOrderDto) -> Result<Self, Self::Error> {
        if dto.id <= 0 {
            return Err(EngineError::validation("id must be positive"));
        }
        Ok(Self {
            id: OrderId::new(dto.id),
            symbol: parse_symbol(&dto.ccy)?,
            exchange: parse_enum::<Exchange>(&dto.exchange)?,
        })
    }
}

impl TryFrom<UpdateTpSlDto> for UpdateTpSl {
    type Error = EngineError;

    fn try_from(dto: UpdateTpSlDto) -> Result<Self, Self::Error> {
        if dto.id <= 0 {
            return Err(EngineError::validation("id must be positive"));
        }
        let take_profit = parse_leg(
            "tpPercent",
            dto.tp_percent.as_deref(),
            "tpPrice",
            dto.tp_price.as_deref(),
            None,
        )?;
        let stop_loss = parse_leg(
            "slPercent",
            dto.sl_percent.as_deref(),
            "slPrice",
            dto.sl_price.as_deref(),
            None,
        )?;
        if take_profit.is_empty() && stop_loss.is_empty() {
            return Err(EngineError::validation(
                "at least one of tpPercent, tpPrice, slPercent, slPrice is required",
            ));
        }
        Ok(Self {
            id: OrderId::new(dto.id),
            symbol: parse_symbol(&dto.symbol)?,
            exchange: parse_enum::<Exchange>(&dto.exchange)?,
            take_profit,
            stop_loss,
        })
    }
}

impl TryFrom<EngineCommand> for Command {
    type Error = EngineError;

    fn try_from(command: EngineCommand) -> Result<Self, Self::Error> {
        Ok(match command {
            EngineCommand::Create(dto) => Self::Create(dto.try_into()?),
            EngineCommand::Cancel(dto) => Self::Cancel(dto.try_into()?),
            EngineCommand::UpdateTpSl(dto) => Self::UpdateTpSl(dto.try_into()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use rust_decimal_macros::dec;

    fn limit_dto() -> CreateOrderDto {
        CreateOrderDto {
            exchange: "binance".to_string(),
            symbol: "btcusdt".to_string(),
            order_type: "LIMIT".to_string(),
            side: "buy".to_string(),
            qty: "0.5".to_string(),
            price: Some("30000".to_string()),
            tif: None,
            stop_percent: None,
            stop_price: None,
            tp_sl: TpSlSettingsDto::default(),
        }
    }

    #[test]
    fn limit_order_defaults_to_gtc() {
        let command = CreateOrder::try_from(limit_dto()).unwrap();
        assert_eq!(command.symbol.as_str(), "BTCUSDT");
        assert_eq!(command.side, OrderSide::Buy);
        assert_eq!(command.quantity, dec!(0.5));
        assert_eq!(command.time_in_force, Some(TimeInForce::Gtc));
        assert!(command.settings.is_empty());
    }

    #[test]
    fn limit_order_requires_price() {
        let mut dto = limit_dto();
        dto.price = None;
        let err = CreateOrder::try_from(dto).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
    }

    #[test]
    fn market_order_has_no_tif() {
        let mut dto = limit_dto();
        dto.order_type = "MARKET".to_string();
        dto.price = None;
        dto.tif = Some("FOK".to_string());
        let command = CreateOrder::try_from(dto).unwrap();
        assert_eq!(command.time_in_force, None);
    }

    #[test]
    fn stop_loss_limit_requires_stop_fields() {
        let mut dto = limit_dto();
        dto.order_type = "STOP_LOSS_LIMIT".to_string();
        dto.stop_price = Some("100".to_string());
        assert!(CreateOrder::try_from(dto.clone()).is_err());

        dto.stop_percent = Some("5".to_string());
        let command = CreateOrder::try_from(dto).unwrap();
        assert_eq!(command.stop_percent, Some(dec!(5)));
    }

    #[test]
    fn stop_percent_above_hundred_is_rejected() {
        let mut dto = limit_dto();
        dto.order_type = "STOP_LOSS_LIMIT".to_string();
        dto.stop_price = Some("100".to_string());
        dto.stop_percent = Some("150".to_string());
        let err = CreateOrder::try_from(dto).unwrap_err();
        assert!(err.message().contains("between 0 and 100"));
    }

    #[test]
    fn malformed_quantity_is_rejected() {
        let mut dto = limit_dto();
        dto.qty = "1e-3".to_string();
        assert!(CreateOrder::try_from(dto).is_err());
    }

    #[test]
    fn bad_symbol_is_rejected() {
        let mut dto = limit_dto();
        dto.symbol = "BTC/USDT".to_string();
        assert!(CreateOrder::try_from(dto).is_err());
    }

    #[test]
    fn settings_are_parsed() {
        let mut dto = limit_dto();
        dto.tp_sl = TpSlSettingsDto {
            tp_percent: Some("10".to_string()),
            sl_price: Some("27000".to_string()),
            sl_type: Some("LIMIT".to_string()),
            ..TpSlSettingsDto::default()
        };
        let command = CreateOrder::try_from(dto).unwrap();
        assert_eq!(command.settings.take_profit, LegSpec::percent(dec!(10)));
        assert_eq!(command.settings.stop_loss.price, Some(dec!(27000)));
        assert_eq!(command.settings.stop_loss.execution_type(), OrderType::Limit);
    }

    #[test]
    fn update_requires_a_leg() {
        let dto = UpdateTpSlDto {
            id: 1,
            symbol: "BTCUSDT".to_string(),
            exchange: "binance".to_string(),
            tp_percent: None,
            sl_percent: Some(String::new()),
            tp_price: None,
            sl_price: None,
        };
        assert!(UpdateTpSl::try_from(dto).is_err());
    }

    #[test]
    fn engine_command_dispatches() {
        let command = Command::try_from(EngineCommand::Cancel(CancelOrderDto {
            id: 9,
            ccy: "ETHUSDT".to_string(),
            exchange: "binance".to_string(),
        }))
        .unwrap();
        assert_eq!(
            command,
            Command::Cancel(CancelOrder {
                id: OrderId::new(9),
                symbol: Symbol::new("ETHUSDT"),
                exchange: Exchange::Binance,
            })
        );
    }
}
