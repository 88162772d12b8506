//! Application Layer
//!
//! The application layer orchestrates domain logic through services.
//! It defines:
//!
//! - **Ports**: Interfaces for interacting with external systems
//! - **Services**: Order lifecycle, account queries and symbol tracking
//! - **Tickers**: Periodic sweeps over the live queues
//! - **DTOs**: Data transfer objects for the command boundary

pub mod dto;
pub mod ports;
pub mod services;
pub mod tickers;

pub use dto::*;
pub use ports::*;
pub use services::*;
pub use tickers::{Evaluation, LimitOrderTicker, TickerConfig, TpSlTicker};
