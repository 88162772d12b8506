//! Shared value objects.

mod exchange;
mod identifiers;
mod symbol;

pub use exchange::Exchange;
pub use identifiers::{ExchangeOrderId, OrderId, UserId};
pub use symbol::Symbol;
