//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: The order record and its TP/SL settings
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Services**: Stateless pricing and trigger rules
//! - **Repository Traits**: Persistence abstractions (implemented in adapters)
//!
//! # Bounded Contexts
//!
//! - [`order_execution`]: Order records, settings, lifecycle and persistence contracts
//! - [`stop_enforcement`]: Live TP/SL and limit-order queues and the trigger rule
//! - [`account`]: Read-only exchange views (balance, depth) and API keys

pub mod account;
pub mod order_execution;
pub mod shared;
pub mod stop_enforcement;
