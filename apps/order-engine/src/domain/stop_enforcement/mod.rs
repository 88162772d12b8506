//! Stop Enforcement Bounded Context
//!
//! In-memory indexes of orders that need live attention: armed TP/SL legs
//! waiting for their trigger price, and resting limit orders waiting for a
//! fill. The order store stays the source of truth; the queues are a
//! low-latency secondary index rebuilt from it once at startup.

mod claim;
mod live_order;
mod orders_queue;
pub mod services;

pub use claim::{ClaimGuard, EvaluationClaim};
pub use live_order::LiveOrder;
pub use orders_queue::{DetachedGroup, OrdersQueue};
pub use services::TriggerRule;
