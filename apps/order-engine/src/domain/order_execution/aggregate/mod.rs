//! Order execution aggregates.

mod order;
mod settings;

pub use order::{NewOrder, Order};
pub use settings::{LegSpec, Settings};
