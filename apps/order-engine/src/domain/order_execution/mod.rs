//! Order Execution Bounded Context
//!
//! Orders placed for users, the TP/SL legs hanging off them, and the rules
//! that move them through their lifecycle.
//!
//! # Key Concepts
//!
//! - **Base order**: what the user placed (market, limit or stop-loss-limit)
//! - **Legs**: take-profit and stop-loss orders that reference the base order's
//!   exchange id and are only sent to the exchange once triggered
//! - **Settings**: the percent/price configuration the legs were derived from

pub mod aggregate;
pub mod errors;
pub mod repository;
pub mod services;
pub mod value_objects;

pub use aggregate::{LegSpec, NewOrder, Order, Settings};
pub use errors::OrderError;
pub use repository::{DefaultSymbolRepository, OrderRepository, OrderTransaction, RepositoryError};
pub use services::{OrderStateMachine, pricing};
pub use value_objects::{OrderSide, OrderStatus, OrderType, TimeInForce, TpSlRole};
