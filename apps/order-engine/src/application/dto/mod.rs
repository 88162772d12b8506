//! Data Transfer Objects (DTOs)
//!
//! Wire shapes of the commands the front-end sends, and the validated,
//! strongly-typed commands the engine executes.

mod commands;
mod order_dto;
mod validation;

pub use commands::{CancelOrder, Command, CommandOutcome, CreateOrder, UpdateTpSl};
pub use order_dto::{
    CancelOrderDto, CreateOrderDto, EngineCommand, OrderDto, TpSlSettingsDto, UpdateTpSlDto,
};
pub use validation::{parse_decimal, parse_percent};
