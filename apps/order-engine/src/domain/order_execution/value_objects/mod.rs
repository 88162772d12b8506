//! Order execution value objects.

mod order_side;
mod order_status;
mod order_type;
mod time_in_force;
mod tp_sl_role;

pub use order_side::OrderSide;
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use time_in_force::TimeInForce;
pub use tp_sl_role::TpSlRole;
