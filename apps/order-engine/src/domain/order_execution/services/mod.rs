//! Order execution domain services.

mod order_state_machine;
pub mod pricing;

pub use order_state_machine::OrderStateMachine;
